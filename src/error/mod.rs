//! Error types and Result aliases for dirscribe.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using dirscribe's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dirscribe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Tree building error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Document output error.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Tree building errors.
///
/// Only failures on the root itself surface here; unreadable entries
/// below the root are skipped during the walk.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The root directory cannot be read.
    #[error("cannot read root '{path}': {reason}")]
    RootUnreadable { path: String, reason: String },

    /// The root exists but is not a directory.
    #[error("root '{path}' is not a directory")]
    NotADirectory { path: String },
}

/// File watcher errors. All of these are fatal to the monitor.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The watched root was removed while monitoring.
    #[error("watched root '{path}' was removed")]
    RootRemoved { path: String },

    /// The notification backend reported an error.
    #[error("notification backend error: {0}")]
    Backend(String),
}

/// Document output errors.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Failed to write the rendered document.
    #[error("failed to write '{path}': {reason}")]
    WriteFailed { path: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error ends a watch session.
    ///
    /// Write and scan failures are confined to one rebuild cycle.
    #[must_use]
    pub const fn is_fatal_to_monitor(&self) -> bool {
        matches!(self, Self::Watcher(_))
    }
}

impl OutputError {
    /// Create a write failure for `path`.
    pub fn write_failed(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::WriteFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
