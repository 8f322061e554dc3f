//! Configuration loader.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config file (`jantteri.toml` in the working directory, or an explicit path)
//! 3. Environment variables (`JANTTERI_*`)
//!
//! Each layer overrides the previous. Command-line flags are applied by the
//! binary on top of the returned value.

use super::{ConfigError, JantteriConfig, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Parses a numeric environment variable into `$field` when it is set.
macro_rules! parse_env_num {
    ($lookup:expr, $field:expr, $var:literal) => {
        if let Some(val) = $lookup($var) {
            $field = parse_num(&val)
                .ok_or_else(|| ConfigError::invalid_env_var($var, "expected unsigned integer"))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```ignore
/// use jantteri_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_config_file("deploy/jantteri.toml")
///     .skip_env_vars()
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Explicit file; must exist when set.
    config_file: Option<PathBuf>,

    /// Directory searched for [`DEFAULT_CONFIG_FILE`] when no explicit file is set.
    working_dir: Option<PathBuf>,

    skip_env: bool,
    skip_file: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads this file instead of the working-directory default.
    /// A missing explicit file is an error.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Looks for `jantteri.toml` in `dir` instead of the process working
    /// directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    #[must_use]
    pub fn skip_config_file(mut self) -> Self {
        self.skip_file = true;
        self
    }

    /// Loads and layers configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing, any file
    /// exists but cannot be read or parsed, or an environment variable
    /// holds an invalid value.
    pub fn load(&self) -> Result<JantteriConfig, ConfigError> {
        let mut config = if self.skip_file {
            JantteriConfig::default()
        } else {
            self.load_file_layer()?
        };

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }

        Ok(config)
    }

    fn load_file_layer(&self) -> Result<JantteriConfig, ConfigError> {
        if let Some(ref path) = self.config_file {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.clone()));
            }
            let config = read_file(path)?;
            debug!(path = %path.display(), "Loaded config file");
            return Ok(config);
        }

        let path = self
            .working_dir
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
            .join(DEFAULT_CONFIG_FILE);

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(JantteriConfig::default());
        }

        let config = read_file(&path)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }
}

fn read_file(path: &Path) -> Result<JantteriConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    JantteriConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Applies `JANTTERI_*` overrides read through `lookup`.
fn apply_env<F>(config: &mut JantteriConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("JANTTERI_SCRIPT") {
        config.script.path = PathBuf::from(val);
    }

    parse_env_num!(lookup, config.session.sleep_slice_ms, "JANTTERI_SLEEP_SLICE_MS");
    parse_env_num!(lookup, config.session.stop_timeout_ms, "JANTTERI_STOP_TIMEOUT_MS");
    parse_env_num!(lookup, config.session.max_id_attempts, "JANTTERI_MAX_ID_ATTEMPTS");

    if let Some(val) = lookup("JANTTERI_LOG_LEVEL") {
        config.logging.level = val;
    }

    Ok(())
}

fn parse_num<T: FromStr>(s: &str) -> Option<T> {
    s.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn load_defaults_only() {
        let config = ConfigLoader::new()
            .skip_config_file()
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config, JantteriConfig::default());
    }

    #[test]
    fn load_from_working_dir() {
        let temp = TempDir::new().unwrap();
        create_config_file(
            temp.path(),
            DEFAULT_CONFIG_FILE,
            r#"
[script]
path = "blink.lua"

[session]
stop_timeout_ms = 1500
"#,
        );

        let config = ConfigLoader::new()
            .with_working_dir(temp.path())
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config.script.path, PathBuf::from("blink.lua"));
        assert_eq!(config.session.stop_timeout_ms, 1500);
        assert_eq!(config.session.sleep_slice_ms, 500);
    }

    #[test]
    fn missing_default_file_ok() {
        let temp = TempDir::new().unwrap();
        let config = ConfigLoader::new()
            .with_working_dir(temp.path())
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config, JantteriConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let err = ConfigLoader::new()
            .with_config_file("/nonexistent/jantteri.toml")
            .skip_env_vars()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn explicit_file_wins_over_working_dir() {
        let temp = TempDir::new().unwrap();
        create_config_file(temp.path(), DEFAULT_CONFIG_FILE, "[logging]\nlevel = \"info\"\n");
        let explicit = create_config_file(temp.path(), "other.toml", "[logging]\nlevel = \"trace\"\n");

        let config = ConfigLoader::new()
            .with_working_dir(temp.path())
            .with_config_file(&explicit)
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = create_config_file(temp.path(), "bad.toml", "[session\nsleep_slice_ms = 1");

        let err = ConfigLoader::new()
            .with_config_file(&path)
            .skip_env_vars()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = JantteriConfig::from_toml("[session]\nsleep_slice_ms = 100\n").unwrap();

        apply_env(
            &mut config,
            env(&[
                ("JANTTERI_SCRIPT", "/srv/blink.lua"),
                ("JANTTERI_SLEEP_SLICE_MS", "25"),
                ("JANTTERI_STOP_TIMEOUT_MS", " 900 "),
                ("JANTTERI_MAX_ID_ATTEMPTS", "8"),
                ("JANTTERI_LOG_LEVEL", "debug"),
            ]),
        )
        .unwrap();

        assert_eq!(config.script.path, PathBuf::from("/srv/blink.lua"));
        assert_eq!(config.session.sleep_slice_ms, 25);
        assert_eq!(config.session.stop_timeout_ms, 900);
        assert_eq!(config.session.max_id_attempts, 8);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn invalid_env_number_rejected() {
        let mut config = JantteriConfig::default();
        let err = apply_env(&mut config, env(&[("JANTTERI_SLEEP_SLICE_MS", "soon")])).unwrap_err();

        match err {
            ConfigError::InvalidEnvVar { name, .. } => assert_eq!(name, "JANTTERI_SLEEP_SLICE_MS"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(config.session.sleep_slice_ms, 500);
    }

    #[test]
    fn parse_num_values() {
        assert_eq!(parse_num::<u64>("42"), Some(42));
        assert_eq!(parse_num::<u64>(" 7 "), Some(7));
        assert_eq!(parse_num::<u64>("-1"), None);
        assert_eq!(parse_num::<u32>("abc"), None);
    }
}
