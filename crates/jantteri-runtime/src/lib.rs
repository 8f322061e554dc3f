//! Session engine for Jantteri.
//!
//! Runs many independent scripts concurrently, one OS thread per session,
//! and lets any caller stop a session cooperatively within one sleep slice.
//!
//! # Architecture
//!
//! ```text
//!   create / end / subscribe
//!            │
//!            ▼
//!   ┌──────────────────┐  start   ┌──────────────┐  execute  ┌────────────┐
//!   │ SessionRegistry  │ ───────► │   Session    │ ────────► │ ScriptHost │
//!   │ (Mutex<HashMap>) │          │ thread + FSM │           │ (e.g. Lua) │
//!   └──────────────────┘          └──────────────┘           └─────┬──────┘
//!            │ join/leave/close                                    │ print / wait /
//!            ▼                                                     ▼ send_activate_event
//!   ┌──────────────────┐          publish            ┌──────────────────┐
//!   │  EventPublisher  │ ◄────────────────────────── │  SessionContext  │
//!   │     (Rooms)      │                             │  (CancelToken)   │
//!   └──────────────────┘                             └──────────────────┘
//! ```
//!
//! # Cancellation
//!
//! [`SessionRegistry::end`] sets the session's [`CancelToken`]. Every
//! [`SessionContext`] operation checks it first and returns
//! [`Checkpoint::Stop`], which the host turns into an unwind of the script.
//! A script that loops without calling any host operation cannot be
//! interrupted; `end` then detaches its thread after the stop timeout.

pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod publisher;
pub mod registry;
pub mod rooms;
pub mod script;
pub mod session;

pub use cancel::{CancelToken, Checkpoint, StopSignal};
pub use config::{ConfigError, ConfigLoader, JantteriConfig};
pub use context::{SessionContext, DEFAULT_SLEEP_SLICE};
pub use error::EngineError;
pub use host::{ScriptHost, ScriptOutcome};
pub use publisher::{EventPublisher, Subscription};
pub use registry::{IdSource, SessionEnd, SessionRegistry};
pub use rooms::Rooms;
pub use script::{load_script, ScriptLoadError};
pub use session::{ExecutionState, Session, SessionInfo};
