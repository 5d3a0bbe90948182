//! Defines the custom error type for the `core` module.

use std::path::{PathBuf, StripPrefixError};
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Every collaborator seam (filesystem, pattern source, state store) reports
/// failures through this enum. The engine recovers most of them locally and
/// logs them; they only reach callers through the persistence paths.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// A path that was required to exist does not.
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// An ignore pattern could not be parsed by the matcher.
    #[error("Invalid ignore pattern: {0}")]
    PatternParse(String),

    /// The persistence collaborator failed to store a value.
    #[error("State store error: {0}")]
    Storage(String),

    /// A persisted value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents a failure to strip a path prefix.
    #[error("Failed to strip prefix from path: {0}")]
    PathStrip(#[from] StripPrefixError),
}

impl CoreError {
    /// Wraps an `io::Error`, mapping `NotFound` and `NotADirectory` kinds onto
    /// the dedicated variants so callers can match on them.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path),
            std::io::ErrorKind::NotADirectory => CoreError::NotADirectory(path),
            _ => CoreError::Io(err, path),
        }
    }
}
