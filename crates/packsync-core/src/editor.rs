//! The external editor collaborator.

use std::path::Path;

/// Hands a package directory to whatever application edits it.
///
/// Opening is fire-and-forget: implementations log failures and never
/// report back to the workflow that asked.
pub trait Editor: Send + Sync {
    fn open(&self, path: &Path);
}

/// An editor that does nothing, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEditor;

impl Editor for NoopEditor {
    fn open(&self, path: &Path) {
        tracing::debug!(path = %path.display(), "Editor disabled, not opening");
    }
}
