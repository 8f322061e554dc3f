//! Lua sandbox binding for Jantteri.
//!
//! [`LuaHost`] implements [`ScriptHost`](jantteri_runtime::ScriptHost): it
//! builds a fresh Lua 5.4 VM for every session, strips everything that
//! reaches outside the VM, and installs exactly three globals:
//!
//! | Global | Effect | Stop behaviour |
//! |--------|--------|----------------|
//! | `print(...)` | `console_output` publication | raises before publishing |
//! | `wait(seconds)` | cooperative sleep | raises within one slice |
//! | `send_activate_event(device_id, delay)` | `jantteri_event` publication | raises before building |
//!
//! # Example
//!
//! ```ignore
//! use jantteri_lua::LuaHost;
//! use jantteri_runtime::{Rooms, SessionRegistry};
//! use std::sync::Arc;
//!
//! let registry = SessionRegistry::new(Arc::new(LuaHost::new()), Arc::new(Rooms::new()))
//!     .with_default_script("print('hello') wait(1) send_activate_event(7, 2.5)");
//! let id = registry.create()?;
//! ```

mod convert;
mod error;
mod host;

pub use error::LuaError;
pub use host::{LuaHost, BLOCKED_GLOBALS};
