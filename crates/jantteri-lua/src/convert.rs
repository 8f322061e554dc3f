//! Lua value conversions used by the host callbacks.

use jantteri_event::EventError;
use mlua::Value;
use std::time::Duration;

/// Renders a value the way Lua's `tostring` does for the common types.
pub(crate) fn lua_display(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => display_number(*n),
        Value::String(s) => s.to_string_lossy().to_string(),
        Value::Error(e) => e.to_string(),
        other => format!("{}: {:p}", other.type_name(), other.to_pointer()),
    }
}

fn display_number(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e16 {
        // Integral floats keep their float-ness: 3.0 prints as "3.0".
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

/// Joins `print` arguments with single spaces.
pub(crate) fn join_display<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    values
        .into_iter()
        .map(lua_display)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Coerces a device reference to an integer.
///
/// Accepts integers, floats (truncated toward zero) and decimal-integer
/// strings with surrounding whitespace.
pub(crate) fn device_id(value: &Value) -> Result<i64, EventError> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Number(n) => {
            let t = n.trunc();
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
                Ok(t as i64)
            } else {
                Err(EventError::InvalidDeviceId(display_number(*n)))
            }
        }
        Value::String(s) => {
            let text = s.to_string_lossy();
            text.trim()
                .parse::<i64>()
                .map_err(|_| EventError::InvalidDeviceId(format!("'{text}'")))
        }
        other => Err(EventError::InvalidDeviceId(format!(
            "expected integer, got {}",
            other.type_name()
        ))),
    }
}

/// Coerces an optional delay to seconds. `nil` means zero. Range checks
/// happen when the event is built.
pub(crate) fn delay(value: &Value) -> Result<f64, EventError> {
    match value {
        Value::Nil => Ok(0.0),
        Value::Integer(i) => Ok(*i as f64),
        Value::Number(n) => Ok(*n),
        Value::String(s) => {
            let text = s.to_string_lossy();
            text.trim()
                .parse::<f64>()
                .map_err(|_| EventError::InvalidDelay(format!("'{text}'")))
        }
        other => Err(EventError::InvalidDelay(format!(
            "expected number, got {}",
            other.type_name()
        ))),
    }
}

/// Converts a `wait` argument to a duration.
///
/// Non-positive and NaN values mean no sleep; values too large to represent
/// saturate.
pub(crate) fn wait_duration(value: &Value) -> mlua::Result<Duration> {
    let seconds = match value {
        Value::Integer(i) => *i as f64,
        Value::Number(n) => *n,
        Value::String(s) => {
            let text = s.to_string_lossy();
            text.trim().parse::<f64>().map_err(|_| {
                mlua::Error::RuntimeError(format!(
                    "wait: expected number of seconds, got '{text}'"
                ))
            })?
        }
        other => {
            return Err(mlua::Error::RuntimeError(format!(
                "wait: expected number of seconds, got {}",
                other.type_name()
            )))
        }
    };

    if seconds.is_nan() || seconds <= 0.0 {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
}
