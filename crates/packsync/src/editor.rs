//! Opening packages in the platform's default application.

use packsync_core::Editor;
use std::path::Path;
use tracing::{info, warn};

/// Opens paths with the system handler (`open` on macOS, `xdg-open` on Linux).
pub struct SystemEditor;

impl Editor for SystemEditor {
    fn open(&self, path: &Path) {
        match open::that_detached(path) {
            Ok(()) => info!(path = %path.display(), "Opened in editor"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to open editor"),
        }
    }
}
