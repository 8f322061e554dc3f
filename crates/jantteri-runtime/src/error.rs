//! Engine boundary errors.
//!
//! Only these conditions fail a `create`/`get`/`end`/`subscribe` call.
//! Faults that happen while a script runs are contained inside the session
//! and surface as console diagnostics instead.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`EngineError::ScriptUnavailable`] | `ENGINE_SCRIPT_UNAVAILABLE` | Yes |
//! | [`EngineError::NotFound`] | `ENGINE_NOT_FOUND` | No |
//! | [`EngineError::IdentifierSpaceExhausted`] | `ENGINE_IDENTIFIER_SPACE_EXHAUSTED` | Yes |
//! | [`EngineError::SessionAlreadyStarted`] | `ENGINE_SESSION_ALREADY_STARTED` | No |
//! | [`EngineError::SpawnFailed`] | `ENGINE_SPAWN_FAILED` | Yes |

use jantteri_types::{ErrorCode, SessionId};
use thiserror::Error;

/// Session engine error.
///
/// # Example
///
/// ```
/// use jantteri_runtime::EngineError;
/// use jantteri_types::ErrorCode;
///
/// let err = EngineError::ScriptUnavailable;
/// assert_eq!(err.code(), "ENGINE_SCRIPT_UNAVAILABLE");
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No default script was loaded, so sessions cannot be created.
    #[error("script not available: no default script was loaded")]
    ScriptUnavailable,

    /// No session is registered under the id.
    #[error("session not found: {0}")]
    NotFound(SessionId),

    /// Every identifier draw collided with a live session.
    #[error("identifier space exhausted after {0} attempts")]
    IdentifierSpaceExhausted(u32),

    /// `start()` was called on a session that is no longer idle.
    #[error("session already started: {0}")]
    SessionAlreadyStarted(SessionId),

    /// The OS refused to spawn the session thread.
    #[error("failed to spawn session thread: {0}")]
    SpawnFailed(String),
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::ScriptUnavailable => "ENGINE_SCRIPT_UNAVAILABLE",
            Self::NotFound(_) => "ENGINE_NOT_FOUND",
            Self::IdentifierSpaceExhausted(_) => "ENGINE_IDENTIFIER_SPACE_EXHAUSTED",
            Self::SessionAlreadyStarted(_) => "ENGINE_SESSION_ALREADY_STARTED",
            Self::SpawnFailed(_) => "ENGINE_SPAWN_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ScriptUnavailable | Self::IdentifierSpaceExhausted(_) | Self::SpawnFailed(_)
        )
    }
}
