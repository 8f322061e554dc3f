//! Configuration with layered overrides.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────┐
//! │  1. Command-line flags (binary only)     │
//! ├──────────────────────────────────────────┤
//! │  2. Environment variables (JANTTERI_*)   │
//! ├──────────────────────────────────────────┤
//! │  3. Config file (jantteri.toml)          │
//! ├──────────────────────────────────────────┤
//! │  4. Default values (compile-time)        │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Example file
//!
//! ```toml
//! [script]
//! path = "scripts/blink.lua"
//!
//! [session]
//! sleep_slice_ms = 250
//! stop_timeout_ms = 5000
//! max_id_attempts = 1024
//!
//! [logging]
//! level = "info"
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{JantteriConfig, LoggingConfig, ScriptConfig, SessionConfig};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "jantteri.toml";
