//! Session registry: the single owner of all live sessions.
//!
//! Every map read or mutation happens inside one short critical section.
//! [`SessionRegistry::end`] releases the lock while it waits for the
//! session to acknowledge the stop, so a slow script never blocks
//! `create`, `list` or other `end` calls.

use crate::config::SessionConfig;
use crate::context::DEFAULT_SLEEP_SLICE;
use crate::error::EngineError;
use crate::host::ScriptHost;
use crate::publisher::{EventPublisher, Subscription};
use crate::session::{ExecutionState, Session, SessionInfo};
use jantteri_types::SessionId;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Produces candidate identifiers; the registry redraws on collision.
pub type IdSource = Box<dyn Fn() -> SessionId + Send + Sync>;

/// Outcome of [`SessionRegistry::end`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEnd {
    pub session_id: SessionId,
    /// State observed after the bounded wait. `Running` means the thread
    /// was detached.
    pub state: ExecutionState,
    pub exited_in_time: bool,
}

struct SessionEntry {
    session: Arc<Session>,
    handle: Option<JoinHandle<()>>,
}

/// Concurrency-safe map from [`SessionId`] to [`Session`].
///
/// # Example
///
/// ```ignore
/// let registry = SessionRegistry::new(Arc::new(LuaHost::new()), Arc::new(Rooms::new()))
///     .with_default_script(source);
///
/// let id = registry.create()?;
/// let mut sub = registry.subscribe(&id)?;
/// // ...
/// registry.end(&id)?;
/// ```
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    host: Arc<dyn ScriptHost>,
    publisher: Arc<dyn EventPublisher>,
    default_script: Option<Arc<str>>,
    sleep_slice: Duration,
    stop_timeout: Duration,
    max_id_attempts: u32,
    id_source: IdSource,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("host", &self.host.name())
            .field("sessions", &self.len())
            .field("has_default_script", &self.default_script.is_some())
            .field("sleep_slice", &self.sleep_slice)
            .field("stop_timeout", &self.stop_timeout)
            .field("max_id_attempts", &self.max_id_attempts)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Creates an empty registry with default tuning and no default script.
    #[must_use]
    pub fn new(host: Arc<dyn ScriptHost>, publisher: Arc<dyn EventPublisher>) -> Self {
        let defaults = SessionConfig::default();
        Self {
            sessions: Mutex::new(HashMap::new()),
            host,
            publisher,
            default_script: None,
            sleep_slice: DEFAULT_SLEEP_SLICE,
            stop_timeout: defaults.stop_timeout(),
            max_id_attempts: defaults.max_id_attempts,
            id_source: Box::new(SessionId::generate),
        }
    }

    /// Sets the script used by [`create`](Self::create).
    #[must_use]
    pub fn with_default_script(mut self, source: impl Into<Arc<str>>) -> Self {
        self.default_script = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_session_config(mut self, config: &SessionConfig) -> Self {
        self.sleep_slice = config.sleep_slice();
        self.stop_timeout = config.stop_timeout();
        self.max_id_attempts = config.max_id_attempts;
        self
    }

    /// Replaces the random identifier generator.
    #[must_use]
    pub fn with_id_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> SessionId + Send + Sync + 'static,
    {
        self.id_source = Box::new(source);
        self
    }

    #[must_use]
    pub fn has_default_script(&self) -> bool {
        self.default_script.is_some()
    }

    #[must_use]
    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }

    /// Starts a new session running the default script.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ScriptUnavailable`] if no default script was loaded
    /// - any error from [`create_with_script`](Self::create_with_script)
    pub fn create(&self) -> Result<SessionId, EngineError> {
        let script = self
            .default_script
            .clone()
            .ok_or(EngineError::ScriptUnavailable)?;
        self.create_with_script(script)
    }

    /// Starts a new session running `source`. Returns once the session
    /// thread exists, not when the script finishes.
    ///
    /// # Errors
    ///
    /// - [`EngineError::IdentifierSpaceExhausted`] if every draw collided
    /// - [`EngineError::SpawnFailed`] if the OS refused a thread
    pub fn create_with_script(&self, source: impl Into<Arc<str>>) -> Result<SessionId, EngineError> {
        let mut sessions = self.sessions.lock();

        let id = self.allocate_id(&sessions)?;
        let session = Arc::new(Session::new(id.clone(), source));
        let handle = session.start(
            Arc::clone(&self.host),
            Arc::clone(&self.publisher),
            self.sleep_slice,
        )?;

        sessions.insert(
            id.clone(),
            SessionEntry {
                session,
                handle: Some(handle),
            },
        );

        info!(session_id = %id, live = sessions.len(), "Session created");
        Ok(id)
    }

    fn allocate_id(
        &self,
        taken: &HashMap<SessionId, SessionEntry>,
    ) -> Result<SessionId, EngineError> {
        let attempts = self.max_id_attempts.max(1);
        for _ in 0..attempts {
            let candidate = (self.id_source)();
            if !taken.contains_key(&candidate) {
                return Ok(candidate);
            }
            debug!(session_id = %candidate, "Identifier collision, redrawing");
        }
        warn!(attempts, "Identifier space exhausted");
        Err(EngineError::IdentifierSpaceExhausted(attempts))
    }

    /// Describes a registered session.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if `id` is not registered.
    pub fn get(&self, id: &SessionId) -> Result<SessionInfo, EngineError> {
        self.sessions
            .lock()
            .get(id)
            .map(|entry| entry.session.info())
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    /// All registered ids, in no particular order. Sessions that finished on
    /// their own stay listed until ended.
    #[must_use]
    pub fn list(&self) -> Vec<SessionId> {
        self.sessions.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Stops a session, waits up to the stop timeout, and removes it.
    ///
    /// Removal is unconditional: a session that ignores the stop (an
    /// infinite loop with no host calls) has its thread detached.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if `id` is not registered.
    pub fn end(&self, id: &SessionId) -> Result<SessionEnd, EngineError> {
        let session = {
            let sessions = self.sessions.lock();
            sessions
                .get(id)
                .map(|entry| Arc::clone(&entry.session))
                .ok_or_else(|| EngineError::NotFound(id.clone()))?
        };

        session.request_stop();
        let exited_in_time = session.join(self.stop_timeout);
        if !exited_in_time {
            warn!(
                session_id = %id,
                timeout_ms = self.stop_timeout.as_millis() as u64,
                "Session did not stop in time, detaching"
            );
        }

        let removed = self.sessions.lock().remove(id);
        if let Some(handle) = removed.and_then(|entry| entry.handle) {
            // A terminal state means the thread is past the script and only
            // returning, so joining here is bounded.
            if exited_in_time || handle.is_finished() {
                if handle.join().is_err() {
                    warn!(session_id = %id, "Session thread panicked");
                }
            } else {
                drop(handle);
            }
        }

        self.publisher.close(id);

        let report = SessionEnd {
            session_id: id.clone(),
            state: session.state(),
            exited_in_time,
        };
        info!(session_id = %id, state = %report.state, exited_in_time, "Session ended");
        Ok(report)
    }

    /// Ends every registered session. Used on shutdown.
    pub fn end_all(&self) -> Vec<SessionEnd> {
        let ids = self.list();
        ids.iter().filter_map(|id| self.end(id).ok()).collect()
    }

    /// Attaches a subscriber to a registered session's publication room.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if `id` is not registered; no room is
    /// created in that case.
    pub fn subscribe(&self, id: &SessionId) -> Result<Subscription, EngineError> {
        let sessions = self.sessions.lock();
        if !sessions.contains_key(id) {
            return Err(EngineError::NotFound(id.clone()));
        }
        Ok(self.publisher.join(id))
    }

    /// Detaches a subscriber. Always succeeds, even after the session ended.
    pub fn unsubscribe(&self, subscription: Subscription) {
        let removed = self
            .publisher
            .leave(subscription.session_id(), subscription.id());
        debug!(
            session_id = %subscription.session_id(),
            subscriber = %subscription.id(),
            removed,
            "Unsubscribed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionContext;
    use crate::host::ScriptOutcome;
    use crate::Rooms;

    struct Idle;

    impl ScriptHost for Idle {
        fn name(&self) -> &'static str {
            "idle"
        }

        fn execute(&self, ctx: &SessionContext, _script: &str) -> ScriptOutcome {
            match ctx.sleep(Duration::from_secs(30)) {
                crate::Checkpoint::Stop => ScriptOutcome::Stopped,
                crate::Checkpoint::Continue => ScriptOutcome::Completed,
            }
        }
    }

    fn registry() -> SessionRegistry {
        let config = SessionConfig {
            sleep_slice_ms: 10,
            ..SessionConfig::default()
        };
        SessionRegistry::new(Arc::new(Idle), Arc::new(Rooms::new()))
            .with_default_script("idle")
            .with_session_config(&config)
    }

    #[test]
    fn create_without_default_script() {
        let registry = SessionRegistry::new(Arc::new(Idle), Arc::new(Rooms::new()));
        assert!(!registry.has_default_script());
        assert_eq!(registry.create(), Err(EngineError::ScriptUnavailable));
        assert!(registry.is_empty());
    }

    #[test]
    fn create_registers_running_session() {
        let registry = registry();
        let id = registry.create().unwrap();

        assert_eq!(registry.list(), vec![id.clone()]);
        let info = registry.get(&id).unwrap();
        assert_eq!(info.session_id, id);
        assert_eq!(info.status, ExecutionState::Running);

        let report = registry.end(&id).unwrap();
        assert_eq!(report.state, ExecutionState::Stopped);
        assert!(report.exited_in_time);
        assert!(registry.is_empty());
    }

    #[test]
    fn end_unknown_session() {
        let registry = registry();
        let id: SessionId = "NOSUCH".parse().unwrap();
        assert_eq!(registry.end(&id), Err(EngineError::NotFound(id)));
    }

    #[test]
    fn subscribe_unknown_session_creates_no_room() {
        let rooms = Arc::new(Rooms::new());
        let registry = SessionRegistry::new(Arc::new(Idle), rooms.clone());
        let id: SessionId = "NOSUCH".parse().unwrap();

        assert_eq!(
            registry.subscribe(&id).unwrap_err(),
            EngineError::NotFound(id)
        );
        assert_eq!(rooms.room_count(), 0);
    }

    #[test]
    fn unsubscribe_after_end_is_fine() {
        let registry = registry();
        let id = registry.create().unwrap();
        let sub = registry.subscribe(&id).unwrap();
        assert_eq!(registry.publisher().subscriber_count(&id), 1);

        registry.end(&id).unwrap();
        registry.unsubscribe(sub);
        assert_eq!(registry.publisher().subscriber_count(&id), 0);
    }

    #[test]
    fn zero_attempts_still_draws_once() {
        let config = SessionConfig {
            max_id_attempts: 0,
            ..SessionConfig::default()
        };
        let registry = registry()
            .with_session_config(&config)
            .with_id_source(|| "AAAAAA".parse().unwrap());

        let id = registry.create().unwrap();
        assert_eq!(
            registry.create(),
            Err(EngineError::IdentifierSpaceExhausted(1))
        );
        registry.end(&id).unwrap();
    }
}
