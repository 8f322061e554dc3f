//! Script host seam.
//!
//! The engine does not know which interpreter runs a script. A
//! [`ScriptHost`] receives the script text plus a [`SessionContext`] and
//! must route every externally visible effect through that context, which
//! is where cancellation is enforced.

use crate::context::SessionContext;

/// How a script run ended, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// The script ran to its natural end.
    Completed,
    /// A stop signal unwound the script.
    Stopped,
    /// The script raised a fault unrelated to cancellation.
    Failed(String),
}

/// Executes one script for one session.
///
/// Called on the session's own thread. Implementations build a fresh
/// interpreter per call; nothing interpreter-side is shared across sessions.
pub trait ScriptHost: Send + Sync {
    /// Short name used in logs and diagnostics (e.g. `"Lua"`).
    fn name(&self) -> &'static str;

    /// Runs `script` to completion, stop, or failure.
    fn execute(&self, ctx: &SessionContext, script: &str) -> ScriptOutcome;
}
