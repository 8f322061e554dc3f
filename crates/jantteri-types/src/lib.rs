//! Core types for the Jantteri session engine.
//!
//! This crate holds the identifier types shared by every layer and the
//! [`ErrorCode`] trait that all Jantteri error enums implement.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  jantteri-types   : SessionId, SubscriberId, ErrorCode ◄ HERE│
//! │  jantteri-event   : StructuredEvent, ConsoleMessage          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  jantteri-runtime : Session, SessionRegistry, Rooms          │
//! │  jantteri-lua     : LuaHost (sandbox binding)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  jantteri-cli     : command-line front end                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use jantteri_types::{SessionId, SubscriberId};
//!
//! let session = SessionId::generate();
//! assert_eq!(session.as_str().len(), SessionId::LEN);
//!
//! let a = SubscriberId::new();
//! let b = SubscriberId::new();
//! assert_ne!(a, b);
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{InvalidSessionId, SessionId, SubscriberId};
