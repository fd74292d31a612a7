//! Error types for BuildKit
//!
//! All pipeline errors are funneled through this enum.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// BuildKit error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required configuration: {}", .keys.join(", "))]
    MissingConfig { keys: Vec<String> },

    #[error("Missing required paths: {}", display_paths(.paths))]
    MissingPaths { paths: Vec<PathBuf> },

    // ========================================================================
    // Pipeline
    // ========================================================================
    #[error("Invalid task id: {0:?}")]
    InvalidTaskId(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task error: {task} - {message}")]
    Task { task: String, message: String },

    // ========================================================================
    // Collaborators
    // ========================================================================
    #[error("Icon manifest error: {0}")]
    Manifest(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Process error: {0}")]
    Process(String),

    // ========================================================================
    // General
    // ========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was raised by a precondition check, before any side effect
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingConfig { .. } | Error::MissingPaths { .. }
        )
    }

    /// Task error helper
    pub fn task(task: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Task {
            task: task.into(),
            message: message.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_names_every_key() {
        let err = Error::MissingConfig {
            keys: vec!["sdk".into(), "scheme".into()],
        };
        assert_eq!(err.to_string(), "Missing required configuration: sdk, scheme");
        assert!(err.is_precondition());
    }

    #[test]
    fn test_missing_paths_display() {
        let err = Error::MissingPaths {
            paths: vec![PathBuf::from("a/Info.plist"), PathBuf::from("b/Icons")],
        };
        assert_eq!(err.to_string(), "Missing required paths: a/Info.plist, b/Icons");
    }

    #[test]
    fn test_process_error_is_not_precondition() {
        assert!(!Error::Process("spawn failed".into()).is_precondition());
    }
}
