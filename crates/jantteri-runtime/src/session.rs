//! Session: one script execution unit and its cancellation contract.
//!
//! # State Machine
//!
//! ```text
//!          start()            host returns
//!   Idle ──────────► Running ─────────────┬──► Completed
//!                                          ├──► Failed
//!                                          └──► Stopped   (stop signal, or
//!                                                          any end after
//!                                                          request_stop)
//! ```
//!
//! Terminal states never change. The state lives behind a mutex paired with
//! a condvar so [`Session::join`] can wait with a timeout; the cancel flag
//! is a separate atomic so `request_stop` never blocks.

use crate::cancel::CancelToken;
use crate::context::SessionContext;
use crate::error::EngineError;
use crate::host::{ScriptHost, ScriptOutcome};
use crate::publisher::EventPublisher;
use chrono::{DateTime, Utc};
use jantteri_types::SessionId;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Execution state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Idle,
    Running,
    Stopped,
    Completed,
    Failed,
}

impl ExecutionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal descriptor returned by `describe`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub status: ExecutionState,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

/// One running instance of a script.
pub struct Session {
    id: SessionId,
    script: Arc<str>,
    cancel: CancelToken,
    state: Mutex<ExecutionState>,
    finished: Condvar,
    created_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("cancel_requested", &self.cancel.is_cancelled())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates an idle session for `script`.
    #[must_use]
    pub fn new(id: SessionId, script: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            script: script.into(),
            cancel: CancelToken::new(),
            state: Mutex::new(ExecutionState::Idle),
            finished: Condvar::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn state(&self) -> ExecutionState {
        *self.state.lock()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.clone(),
            status: self.state(),
            created_at: self.created_at,
            message: format!(
                "Join the session channel for {} to receive console output",
                self.id
            ),
        }
    }

    /// Moves the session to `Running` and executes the script on a new
    /// thread named `session-<ID>`. Returns as soon as the thread exists.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SessionAlreadyStarted`] if the session is not idle
    /// - [`EngineError::SpawnFailed`] if the thread cannot be created; the
    ///   session is then marked `Failed`
    pub fn start(
        self: &Arc<Self>,
        host: Arc<dyn ScriptHost>,
        publisher: Arc<dyn EventPublisher>,
        sleep_slice: Duration,
    ) -> Result<JoinHandle<()>, EngineError> {
        {
            let mut state = self.state.lock();
            if *state != ExecutionState::Idle {
                return Err(EngineError::SessionAlreadyStarted(self.id.clone()));
            }
            *state = ExecutionState::Running;
        }

        let ctx = SessionContext::new(self.id.clone(), self.cancel.clone(), publisher)
            .with_sleep_slice(sleep_slice);
        let session = Arc::clone(self);

        std::thread::Builder::new()
            .name(format!("session-{}", self.id))
            .spawn(move || session.run(host.as_ref(), &ctx))
            .map_err(|e| {
                tracing::error!(session_id = %self.id, error = %e, "Failed to spawn session thread");
                self.finish(ExecutionState::Failed);
                EngineError::SpawnFailed(e.to_string())
            })
    }

    /// Requests a cooperative stop. Idempotent, non-blocking, callable from
    /// any thread, and a no-op once the session has finished.
    pub fn request_stop(&self) {
        if self.cancel.cancel() {
            tracing::debug!(session_id = %self.id, state = %self.state(), "Stop requested");
        }
    }

    /// Blocks until the session reaches a terminal state or `timeout`
    /// elapses. Returns whether it finished in time.
    pub fn join(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if !state.is_terminal() {
            let _ = self
                .finished
                .wait_while_for(&mut state, |s| !s.is_terminal(), timeout);
        }
        state.is_terminal()
    }

    fn run(&self, host: &dyn ScriptHost, ctx: &SessionContext) {
        tracing::info!(session_id = %self.id, host = host.name(), "Session started");

        let state = match host.execute(ctx, &self.script) {
            ScriptOutcome::Completed if self.cancel.is_cancelled() => ExecutionState::Stopped,
            ScriptOutcome::Completed => ExecutionState::Completed,
            ScriptOutcome::Stopped => ExecutionState::Stopped,
            ScriptOutcome::Failed(reason) => {
                tracing::warn!(session_id = %self.id, error = %reason, "Script failed");
                ctx.diagnostic(format!("Error running {} script: {reason}", host.name()));
                ExecutionState::Failed
            }
        };

        self.finish(state);
    }

    fn finish(&self, terminal: ExecutionState) {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return;
        }
        *state = terminal;
        self.finished.notify_all();
        tracing::info!(session_id = %self.id, state = %terminal, "Session finished");
    }
}
