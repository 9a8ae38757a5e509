//! Error types for the core crate.

use packsync_snapshot::SnapshotError;
use thiserror::Error;

/// Core error types.
///
/// The `Display` form is the status line shown to the user when a
/// workflow fails.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Scanning, copying or merging a tree failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The catalog could not be loaded or saved.
    #[error(transparent)]
    Storage(#[from] packsync_storage::StorageError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Project not found.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Version not found (in the given project, or anywhere).
    #[error("version not found: {0}")]
    VersionNotFound(String),

    /// Member not found.
    #[error("{user} is not a member of {project}")]
    MemberNotFound { project: String, user: String },

    /// Member ids are unique per project, ignoring case.
    #[error("{user} is already a member of {project}")]
    DuplicateMember { project: String, user: String },

    /// Only the project owner may hold the owner role.
    #[error("{project} already has an owner")]
    OwnerExists { project: String },

    /// The owner cannot be removed from a project.
    #[error("cannot remove the owner of {project}")]
    OwnerRemoval { project: String },

    /// A project keeps at least one version.
    #[error("cannot delete the only version of {project}")]
    LastVersion { project: String },
}

impl CoreError {
    /// Whether the error names a project, version or member that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProjectNotFound(_)
                | CoreError::VersionNotFound(_)
                | CoreError::MemberNotFound { .. }
        )
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Config validation failed.
    #[error("config validation failed: {message}")]
    Validation { message: String },

    /// Invalid path (e.g., could not determine config directory).
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
