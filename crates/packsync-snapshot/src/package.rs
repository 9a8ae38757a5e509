//! Package type validation.

use crate::error::{SnapshotError, SnapshotResult};
use std::path::Path;

/// The kind of directory package a workspace accepts, identified by extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageKind {
    extension: String,
}

impl PackageKind {
    /// Create a package kind from an extension, with or without a leading dot.
    pub fn new(extension: impl AsRef<str>) -> Self {
        Self {
            extension: extension
                .as_ref()
                .trim()
                .trim_start_matches('.')
                .to_lowercase(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether the path carries this package's extension (case-insensitive).
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Check that `path` is a directory with this package's extension.
    ///
    /// Run this before scanning a user-selected source.
    pub fn validate(&self, path: &Path) -> SnapshotResult<()> {
        if !path.is_dir() {
            return Err(SnapshotError::NotDirectory(path.to_path_buf()));
        }
        if !self.matches(path) {
            return Err(SnapshotError::NotPackageType {
                path: path.to_path_buf(),
                expected: self.extension.clone(),
            });
        }
        Ok(())
    }

    /// The on-disk directory name for a package called `name`.
    pub fn file_name(&self, name: &str) -> String {
        format!(
            "{}.{}",
            packsync_util::path::sanitize_component(name),
            self.extension
        )
    }

    /// Derive a display name from a package path (`/x/My Song.logicx` -> `My Song`).
    pub fn display_name(&self, path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }
}

impl Default for PackageKind {
    fn default() -> Self {
        Self::new("logicx")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_normalizes_extension() {
        assert_eq!(PackageKind::new(".LogicX").extension(), "logicx");
        assert_eq!(PackageKind::new("band").extension(), "band");
    }

    #[test]
    fn test_validate() {
        let dir = tempdir().unwrap();
        let kind = PackageKind::new("band");

        let good = dir.path().join("Song.BAND");
        std::fs::create_dir(&good).unwrap();
        assert!(kind.validate(&good).is_ok());

        let wrong = dir.path().join("Song.logicx");
        std::fs::create_dir(&wrong).unwrap();
        assert!(matches!(
            kind.validate(&wrong),
            Err(SnapshotError::NotPackageType { .. })
        ));

        let file = dir.path().join("file.band");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            kind.validate(&file),
            Err(SnapshotError::NotDirectory(_))
        ));
    }

    #[test]
    fn test_file_and_display_name() {
        let kind = PackageKind::default();
        assert_eq!(kind.file_name("My Song"), "My Song.logicx");
        assert_eq!(kind.file_name("a/b"), "a_b.logicx");
        assert_eq!(kind.display_name(Path::new("/x/My Song.logicx")), "My Song");
    }
}
