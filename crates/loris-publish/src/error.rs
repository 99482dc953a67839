//! Sync errors.

use std::path::PathBuf;

use loris_site::SiteError;

/// Error returned while syncing a directory to a bucket.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("S3 error: {0}")]
    S3(String),
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error(transparent)]
    Site(#[from] SiteError),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
