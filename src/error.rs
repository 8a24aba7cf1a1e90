//! Custom error types for dumback
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for dumback operations
#[derive(Error, Debug)]
pub enum DumbackError {
    /// Configuration persistence errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration values
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required setting has not been configured yet
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    /// A backup run currently holds the single-flight slot
    #[error("A backup is already in progress")]
    BackupInProgress,

    /// The orchestrator has been shut down
    #[error("Backup agent is shutting down")]
    ShuttingDown,

    /// Archive creation failed while processing a source directory
    #[error("Failed to archive '{}': {reason}", dir.display())]
    Archive { dir: PathBuf, reason: String },

    /// A filesystem operation on a specific path failed
    #[error("I/O error at '{}': {reason}", path.display())]
    FileSystem { path: PathBuf, reason: String },

    /// File I/O errors without a known path
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// The blocking worker running a backup failed to complete
    #[error("Worker error: {0}")]
    Worker(String),
}

impl DumbackError {
    /// Create a filesystem error attached to `path`
    pub fn at_path(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::FileSystem {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    /// Create an archive error for the source directory `dir`
    pub fn archive(dir: &Path, err: impl std::fmt::Display) -> Self {
        Self::Archive {
            dir: dir.to_path_buf(),
            reason: err.to_string(),
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if the operation was refused because of an in-flight run or shutdown
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::BackupInProgress | Self::ShuttingDown)
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for DumbackError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DumbackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for dumback operations
pub type DumbackResult<T> = Result<T, DumbackError>;
