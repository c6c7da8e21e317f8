//! Error types for the batch engine

use std::path::PathBuf;

use thiserror::Error;

/// Folder argument errors; the only batch errors that abort a run
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// One file of a batch run failed
///
/// Logged and counted; no marker is written, so the next run retries the file.
#[derive(Debug, Error)]
#[error("{}: {}", .path.display(), .cause)]
pub struct BatchItemError {
    pub path: PathBuf,
    #[source]
    pub cause: iscc_common::Error,
}

impl BatchItemError {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<iscc_common::Error>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }
}
