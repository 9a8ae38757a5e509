//! Test doubles for core collaborators.

use packsync_core::Editor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// An editor that records every path it is asked to open.
///
/// # Example
///
/// ```rust
/// use packsync_core::Editor;
/// use packsync_test_utils::mocks::RecordingEditor;
/// use std::path::Path;
///
/// let editor = RecordingEditor::new();
/// editor.open(Path::new("/tmp/Song.logicx"));
/// assert_eq!(editor.opened().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct RecordingEditor {
    opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths opened so far, oldest first.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }

    pub fn last_opened(&self) -> Option<PathBuf> {
        self.opened.lock().unwrap().last().cloned()
    }
}

impl Editor for RecordingEditor {
    fn open(&self, path: &Path) {
        self.opened.lock().unwrap().push(path.to_path_buf());
    }
}
