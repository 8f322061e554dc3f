//! Per-session host primitives.
//!
//! [`SessionContext`] is what a [`ScriptHost`](crate::ScriptHost) binds into
//! the interpreter. It implements the three script-visible operations and
//! the cancellation contract shared by all of them:
//!
//! | Operation | Checkpoints |
//! |-----------|-------------|
//! | [`emit_text`](SessionContext::emit_text) | before publishing |
//! | [`sleep`](SessionContext::sleep) | on entry, after every slice, on exit |
//! | [`emit_event`](SessionContext::emit_event) | before building the event |
//!
//! A [`Checkpoint::Stop`] return means the operation produced no effect and
//! the host must unwind the script.

use crate::cancel::{CancelToken, Checkpoint};
use crate::publisher::EventPublisher;
use jantteri_event::{ConsoleMessage, EventError, Publication, StructuredEvent};
use jantteri_types::SessionId;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default upper bound for one sleep slice.
pub const DEFAULT_SLEEP_SLICE: Duration = Duration::from_millis(500);

/// Handle a running script uses to reach the outside world.
///
/// Cheap to clone; clones share the cancel flag and the publisher.
#[derive(Clone)]
pub struct SessionContext {
    id: SessionId,
    cancel: CancelToken,
    publisher: Arc<dyn EventPublisher>,
    sleep_slice: Duration,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("sleep_slice", &self.sleep_slice)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    #[must_use]
    pub fn new(id: SessionId, cancel: CancelToken, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            id,
            cancel,
            publisher,
            sleep_slice: DEFAULT_SLEEP_SLICE,
        }
    }

    /// Overrides the sleep slice. A zero slice is bumped to one millisecond.
    #[must_use]
    pub fn with_sleep_slice(mut self, slice: Duration) -> Self {
        self.sleep_slice = slice.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn sleep_slice(&self) -> Duration {
        self.sleep_slice
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.cancel.checkpoint()
    }

    /// Publishes one line of script output on `console_output`.
    pub fn emit_text(&self, message: impl Into<String>) -> Checkpoint {
        if self.checkpoint().is_stop() {
            return Checkpoint::Stop;
        }
        self.publish_console(message.into());
        Checkpoint::Continue
    }

    /// Suspends the calling thread for `duration`, in slices, observing a
    /// stop request within one slice.
    pub fn sleep(&self, duration: Duration) -> Checkpoint {
        if self.checkpoint().is_stop() {
            return Checkpoint::Stop;
        }

        // Measured from the start rather than as a deadline so that
        // `Duration::MAX` cannot overflow `Instant`.
        let start = Instant::now();
        loop {
            let elapsed = start.elapsed();
            if elapsed >= duration || self.cancel.is_cancelled() {
                break;
            }
            std::thread::sleep(self.sleep_slice.min(duration - elapsed));
        }

        self.checkpoint()
    }

    /// Builds a structured event with `build` and publishes it on
    /// `jantteri_event`.
    ///
    /// Construction or serialization failures never reach the script: they
    /// are published as a console diagnostic and the call returns
    /// [`Checkpoint::Continue`].
    pub fn emit_event<F>(&self, build: F) -> Checkpoint
    where
        F: FnOnce() -> Result<StructuredEvent, EventError>,
    {
        if self.checkpoint().is_stop() {
            return Checkpoint::Stop;
        }

        match build().and_then(|event| Publication::event(&event)) {
            Ok(publication) => self.publisher.publish(&self.id, publication),
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Event construction failed");
                self.diagnostic(format!("Error creating jantteri_event: {e}"));
            }
        }
        Checkpoint::Continue
    }

    /// Publishes an engine diagnostic on `console_output`.
    ///
    /// Not a checkpoint: diagnostics about a failed or stopping script are
    /// still delivered.
    pub fn diagnostic(&self, message: impl Into<String>) {
        self.publish_console(message.into());
    }

    fn publish_console(&self, message: String) {
        let msg = ConsoleMessage::now(self.id.clone(), message);
        self.publisher.publish(&self.id, Publication::console(&msg));
    }
}
