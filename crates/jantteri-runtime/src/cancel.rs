//! Cooperative cancellation.
//!
//! A [`CancelToken`] is a single flag written by the stop path and read by
//! the session thread. Host callbacks call [`CancelToken::checkpoint`]
//! before producing any externally visible effect and bail out on
//! [`Checkpoint::Stop`].
//!
//! ```text
//! registry.end(id)                    session thread
//!      │                                   │
//!      ├─ token.cancel() ───────────────►  print(...)
//!      │                                   ├─ checkpoint() == Stop
//!      │                                   └─ unwind with StopSignal
//!      └─ session.join(timeout) ◄──────────── state = Stopped
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Result of a cancellation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Checkpoint {
    /// No stop requested; the callback may perform its side effect.
    Continue,
    /// Stop requested; the callback must abort without side effects.
    Stop,
}

impl Checkpoint {
    #[must_use]
    pub fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }

    /// Converts to a `Result` so callers can use `?`.
    ///
    /// # Errors
    ///
    /// Returns [`StopSignal`] on [`Checkpoint::Stop`].
    pub fn into_result(self) -> Result<(), StopSignal> {
        match self {
            Self::Continue => Ok(()),
            Self::Stop => Err(StopSignal),
        }
    }
}

/// The unwind condition raised inside a script once a stop was requested.
///
/// Not an error outcome: a script that ends with this yields
/// `ExecutionState::Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session stopped")]
pub struct StopSignal;

/// Shared, set-once cancellation flag.
///
/// Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    ///
    /// Returns `true` if this call flipped the flag, `false` if it was
    /// already set.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        if self.is_cancelled() {
            Checkpoint::Stop
        } else {
            Checkpoint::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.checkpoint(), Checkpoint::Continue);
        assert!(token.checkpoint().into_result().is_ok());
    }

    #[test]
    fn cancel_is_set_once() {
        let token = CancelToken::new();
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
        assert!(token.checkpoint().is_stop());
        assert_eq!(token.checkpoint().into_result(), Err(StopSignal));
    }

    #[test]
    fn clones_share_flag() {
        let token = CancelToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn visible_across_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || {
            remote.cancel();
        })
        .join()
        .unwrap();
        assert!(token.is_cancelled());
    }
}
