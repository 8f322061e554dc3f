//! Loading the default script from disk.

use jantteri_types::ErrorCode;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("script not found: '{0}'")]
    NotFound(PathBuf),

    #[error("failed to read script '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file holds nothing but whitespace.
    #[error("script is empty: '{0}'")]
    Empty(PathBuf),
}

impl ErrorCode for ScriptLoadError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SCRIPT_NOT_FOUND",
            Self::Read { .. } => "SCRIPT_READ",
            Self::Empty(_) => "SCRIPT_EMPTY",
        }
    }

    fn is_recoverable(&self) -> bool {
        // The registry keeps running without a default script.
        true
    }
}

/// Reads the script at `path` as UTF-8 text.
///
/// # Errors
///
/// See [`ScriptLoadError`].
pub fn load_script(path: impl AsRef<Path>) -> Result<String, ScriptLoadError> {
    let path = path.as_ref();

    let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScriptLoadError::NotFound(path.to_path_buf()),
        _ => ScriptLoadError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    if source.trim().is_empty() {
        return Err(ScriptLoadError::Empty(path.to_path_buf()));
    }

    tracing::debug!(path = %path.display(), bytes = source.len(), "Loaded script");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jantteri_types::assert_error_codes;
    use tempfile::TempDir;

    #[test]
    fn loads_existing_script() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blink.lua");
        std::fs::write(&path, "print(\"hi\")\n").unwrap();

        assert_eq!(load_script(&path).unwrap(), "print(\"hi\")\n");
    }

    #[test]
    fn missing_script() {
        let temp = TempDir::new().unwrap();
        let err = load_script(temp.path().join("nope.lua")).unwrap_err();
        assert!(matches!(err, ScriptLoadError::NotFound(_)));
    }

    #[test]
    fn blank_script_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blank.lua");
        std::fs::write(&path, "  \n\t\n").unwrap();

        assert!(matches!(load_script(&path), Err(ScriptLoadError::Empty(_))));
    }

    #[test]
    fn directory_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = load_script(temp.path()).unwrap_err();
        assert!(matches!(
            err,
            ScriptLoadError::Read { .. } | ScriptLoadError::NotFound(_)
        ));
    }

    #[test]
    fn all_error_codes_valid() {
        let errors = vec![
            ScriptLoadError::NotFound(PathBuf::from("a.lua")),
            ScriptLoadError::Read {
                path: PathBuf::from("a.lua"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "x"),
            },
            ScriptLoadError::Empty(PathBuf::from("a.lua")),
        ];
        assert_error_codes(&errors, "SCRIPT_");
    }
}
