//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration after all layers are applied.
///
/// # Example
///
/// ```
/// use jantteri_runtime::config::JantteriConfig;
///
/// let config = JantteriConfig::default();
/// assert_eq!(config.session.sleep_slice_ms, 500);
/// assert_eq!(config.logging.level, "warn");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JantteriConfig {
    pub script: ScriptConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl JantteriConfig {
    /// Deserializes from a TOML string; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or a value has the wrong type.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serializes to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Default script location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScriptConfig {
    pub path: PathBuf,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("default_script.lua"),
        }
    }
}

/// Session engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Granularity of `wait`; also the worst-case stop latency while sleeping.
    pub sleep_slice_ms: u64,

    /// How long `end` waits for a session to acknowledge a stop.
    pub stop_timeout_ms: u64,

    /// Identifier draws before `create` gives up.
    pub max_id_attempts: u32,
}

impl SessionConfig {
    #[must_use]
    pub fn sleep_slice(&self) -> Duration {
        Duration::from_millis(self.sleep_slice_ms.max(1))
    }

    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sleep_slice_ms: 500,
            stop_timeout_ms: 5_000,
            max_id_attempts: 1024,
        }
    }
}

/// Log filter used when neither flags nor `RUST_LOG` choose one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}
