//! Event construction errors.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`EventError::InvalidDeviceId`] | `EVENT_INVALID_DEVICE_ID` | No |
//! | [`EventError::InvalidDelay`] | `EVENT_INVALID_DELAY` | No |
//! | [`EventError::Serialize`] | `EVENT_SERIALIZE` | No |
//!
//! These never cross the engine boundary. The sandbox binding converts them
//! into console diagnostics and lets the script carry on.

use jantteri_types::ErrorCode;
use thiserror::Error;

/// A structured event could not be built or serialized.
#[derive(Debug, Error)]
pub enum EventError {
    /// The device reference is not an integer.
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),

    /// The delay is not a finite, non-negative number.
    #[error("invalid delay: {0}")]
    InvalidDelay(String),

    /// The event could not be converted to its keyed form.
    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidDeviceId(_) => "EVENT_INVALID_DEVICE_ID",
            Self::InvalidDelay(_) => "EVENT_INVALID_DELAY",
            Self::Serialize(_) => "EVENT_SERIALIZE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
