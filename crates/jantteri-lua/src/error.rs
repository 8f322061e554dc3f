//! Error types for Lua VM setup.

use jantteri_types::ErrorCode;
use thiserror::Error;

/// Failure to build or bind a session VM.
///
/// Script faults are not represented here: they end the session as
/// `Failed` with a console diagnostic.
#[derive(Debug, Error)]
pub enum LuaError {
    #[error("lua error: {0}")]
    Runtime(#[from] mlua::Error),
}

impl ErrorCode for LuaError {
    fn code(&self) -> &'static str {
        match self {
            Self::Runtime(_) => "LUA_RUNTIME",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jantteri_types::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        let errors = vec![LuaError::from(mlua::Error::RuntimeError("x".into()))];
        assert_error_codes(&errors, "LUA_");
    }

    #[test]
    fn display_wraps_mlua_message() {
        let err = LuaError::from(mlua::Error::RuntimeError("boom".into()));
        let text = err.to_string();
        assert!(text.starts_with("lua error:"));
        assert!(text.contains("boom"));
    }
}
