//! Snapshot error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while scanning, copying or merging package trees.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The selected path is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotDirectory(PathBuf),

    /// The directory does not carry the expected package extension.
    #[error("Not a .{expected} package: {}", path.display())]
    NotPackageType { path: PathBuf, expected: String },

    /// Reading, copying or hashing failed.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A version snapshot already exists at the target path.
    #[error("Snapshot already exists: {}", .0.display())]
    SnapshotExists(PathBuf),

    /// A copy or merge was asked to write into its own source tree.
    #[error("Cannot copy {} into {}", src.display(), dst.display())]
    InvalidTarget { src: PathBuf, dst: PathBuf },

    /// The background worker running the operation panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SnapshotError {
    /// Create an IO error tied to the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Attach a path to `std::io` results.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &Path) -> SnapshotResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> SnapshotResult<T> {
        self.map_err(|e| SnapshotError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_package_type_message() {
        let err = SnapshotError::NotPackageType {
            path: PathBuf::from("/tmp/song"),
            expected: "logicx".to_string(),
        };
        assert_eq!(err.to_string(), "Not a .logicx package: /tmp/song");
    }

    #[test]
    fn test_io_keeps_source() {
        let err = SnapshotError::io(
            "/tmp/a.wav",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/a.wav"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
