//! Error types for cellblock
//!
//! Only construction and configuration APIs surface these errors. The
//! execution path converts every failure into an `ExecutionResult`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cellblock operations
pub type CellblockResult<T> = Result<T, CellblockError>;

/// Errors that can occur while configuring or orchestrating a sandbox
#[derive(Debug, Clone, Error)]
pub enum CellblockError {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Configuration was parsed but violates an invariant
    #[error("Invalid sandbox configuration: {0}")]
    InvalidConfig(String),

    /// Scratch directory could not be created or written
    #[error("Scratch directory error: {0}")]
    ScratchDir(String),

    /// Interpreter process could not be spawned
    #[error("Failed to spawn sandboxed process: {0}")]
    SpawnFailed(String),

    /// I/O error while talking to the child process
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON/YAML/TOML (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Sandbox internal error: {0}")]
    Internal(String),
}

impl CellblockError {
    /// Create a configuration error tied to a file
    pub fn config_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        CellblockError::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a configuration error without a file
    pub fn config(message: impl Into<String>) -> Self {
        CellblockError::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Whether the error was caused by the host environment rather than the caller
    pub fn is_host_failure(&self) -> bool {
        matches!(
            self,
            CellblockError::ScratchDir(_)
                | CellblockError::SpawnFailed(_)
                | CellblockError::Io(_)
                | CellblockError::Internal(_)
        )
    }
}

impl From<std::io::Error> for CellblockError {
    fn from(err: std::io::Error) -> Self {
        CellblockError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CellblockError {
    fn from(err: serde_json::Error) -> Self {
        CellblockError::Serialization(err.to_string())
    }
}

impl From<regex::Error> for CellblockError {
    fn from(err: regex::Error) -> Self {
        CellblockError::InvalidConfig(format!("invalid pattern: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CellblockError::config_at("bad toml", "/etc/cellblock.toml");
        assert!(err.to_string().contains("bad toml"));

        let err = CellblockError::SpawnFailed("python3 not found".into());
        assert!(err.to_string().contains("python3 not found"));
    }

    #[test]
    fn test_host_failure_classification() {
        assert!(CellblockError::ScratchDir("disk full".into()).is_host_failure());
        assert!(CellblockError::SpawnFailed("EAGAIN".into()).is_host_failure());
        assert!(!CellblockError::InvalidConfig("zero timeout".into()).is_host_failure());
        assert!(!CellblockError::config("missing").is_host_failure());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CellblockError = io.into();
        assert!(matches!(err, CellblockError::Io(_)));
    }

    #[test]
    fn test_regex_conversion() {
        let err: CellblockError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, CellblockError::InvalidConfig(_)));
    }
}
