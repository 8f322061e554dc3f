//! Structured domain events.

use crate::EventError;
use serde::{Deserialize, Serialize};

/// Kind of a [`StructuredEvent`].
///
/// Serialized in SCREAMING_SNAKE_CASE to match the enum names the device
/// firmware already understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum EventKind {
    /// Ask a device to activate, optionally after a delay.
    ActivateRequest,
}

/// An immutable, timestamped record emitted by a script.
///
/// Fields are private; the only way to obtain one is through a validating
/// constructor, so a published event always has a finite, non-negative delay
/// and a timestamp taken at emission time.
///
/// # Keyed Form
///
/// ```json
/// { "device_id": 7, "event_kind": "ACTIVATE_REQUEST", "timestamp": 1760000000, "delay": 2.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredEvent {
    device_id: i64,
    event_kind: EventKind,
    timestamp: i64,
    delay: f64,
}

impl StructuredEvent {
    /// Builds an activation request stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidDelay`] if `delay` is negative, NaN or
    /// infinite.
    pub fn activate_request(device_id: i64, delay: f64) -> Result<Self, EventError> {
        Self::new(device_id, EventKind::ActivateRequest, delay, crate::unix_seconds())
    }

    fn new(
        device_id: i64,
        event_kind: EventKind,
        delay: f64,
        timestamp: i64,
    ) -> Result<Self, EventError> {
        if !delay.is_finite() {
            return Err(EventError::InvalidDelay(format!(
                "expected a finite number, got {delay}"
            )));
        }
        if delay < 0.0 {
            return Err(EventError::InvalidDelay(format!(
                "expected a non-negative number, got {delay}"
            )));
        }

        Ok(Self {
            device_id,
            event_kind,
            timestamp,
            // Normalize -0.0 so the keyed form never carries a sign.
            delay: delay + 0.0,
        })
    }

    #[must_use]
    pub fn device_id(&self) -> i64 {
        self.device_id
    }

    #[must_use]
    pub fn event_kind(&self) -> EventKind {
        self.event_kind
    }

    /// Seconds since the Unix epoch at which the event was built.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Seconds the device should wait before acting.
    #[must_use]
    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Converts the event to its keyed, transport-neutral form.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialize`] if conversion fails.
    pub fn to_payload(&self) -> Result<serde_json::Value, EventError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_request_fields() {
        let before = crate::unix_seconds();
        let event = StructuredEvent::activate_request(7, 2.5).unwrap();
        let after = crate::unix_seconds();

        assert_eq!(event.device_id(), 7);
        assert_eq!(event.event_kind(), EventKind::ActivateRequest);
        assert!((event.delay() - 2.5).abs() < f64::EPSILON);
        assert!(event.timestamp() >= before && event.timestamp() <= after);
    }

    #[test]
    fn zero_delay_allowed() {
        let event = StructuredEvent::activate_request(1, 0.0).unwrap();
        assert_eq!(event.delay(), 0.0);

        let negative_zero = StructuredEvent::activate_request(1, -0.0).unwrap();
        assert!(negative_zero.delay().is_sign_positive());
    }

    #[test]
    fn negative_delay_rejected() {
        let err = StructuredEvent::activate_request(1, -1.0).unwrap_err();
        assert!(matches!(err, EventError::InvalidDelay(_)));
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn non_finite_delay_rejected() {
        assert!(StructuredEvent::activate_request(1, f64::NAN).is_err());
        assert!(StructuredEvent::activate_request(1, f64::INFINITY).is_err());
    }

    #[test]
    fn payload_keys_are_stable() {
        let event = StructuredEvent::new(42, EventKind::ActivateRequest, 1.5, 1_700_000_000)
            .unwrap();
        let payload = event.to_payload().unwrap();

        assert_eq!(
            payload,
            serde_json::json!({
                "device_id": 42,
                "event_kind": "ACTIVATE_REQUEST",
                "timestamp": 1_700_000_000,
                "delay": 1.5,
            })
        );
    }
}
