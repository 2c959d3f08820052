use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while inspecting or evicting iCloud files.
///
/// Only classification and scanning surface these to callers. Eviction
/// strategies, policy writes and verification absorb them into booleans and
/// reason strings so that one bad file never aborts a batch.
#[derive(Debug, Error)]
pub enum Error {
    /// File or directory not found
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied while reading the file or its attributes
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Invalid path provided
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// iCloud Drive is not available or not configured
    #[error("iCloud Drive is not available: {0}")]
    ICloudNotAvailable(String),

    /// External tool is not installed
    #[error("{0} not found on PATH")]
    ToolNotFound(String),

    /// External tool exited with a non-zero status
    #[error("{tool} failed: {stderr}")]
    ToolFailed {
        /// Program name
        tool: String,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true if the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if an external tool could not be launched at all.
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, Error::ToolNotFound(_))
    }

    /// Returns true for failures a strategy is expected to run into and
    /// report as a plain unsuccessful attempt.
    pub fn is_expected_failure(&self) -> bool {
        matches!(
            self,
            Error::ToolNotFound(_)
                | Error::ToolFailed { .. }
                | Error::PermissionDenied(_)
                | Error::NotFound(_)
        )
    }

    /// Map an IO error on `path` to the matching variant.
    pub(crate) fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
            _ => Error::Io(err),
        }
    }
}

/// Result type for iCloud operations
pub type Result<T> = std::result::Result<T, Error>;
