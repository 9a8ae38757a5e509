//! Test fixtures for creating reproducible package trees.
//!
//! Provides temporary directory packages and a ready-to-use workspace
//! (snapshot store plus JSON catalog) rooted in a temp dir.

use packsync_core::{CatalogStore, CoreResult, VersionHistory};
use packsync_snapshot::{PackageKind, SnapshotStore};
use packsync_storage::JsonStorage;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A temporary directory package with configurable contents.
///
/// The package lives at `<tempdir>/<name>.<extension>` and is removed when
/// the built package is dropped.
///
/// # Example
///
/// ```rust
/// use packsync_test_utils::fixtures::TestPackage;
///
/// let package = TestPackage::new("Song")
///     .with_file("ProjectData", "tempo=120")
///     .with_file("Media/take1.wav", "riff")
///     .build();
///
/// assert!(package.path().ends_with("Song.logicx"));
/// assert!(package.path().join("Media/take1.wav").exists());
/// ```
pub struct TestPackage {
    temp_dir: TempDir,
    name: String,
    extension: String,
    /// Files to create (path relative to the package root -> contents).
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Directories to create (paths relative to the package root).
    dirs: Vec<PathBuf>,
}

impl TestPackage {
    /// Create a new package builder with the default `logicx` extension.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            name: name.into(),
            extension: PackageKind::default().extension().to_string(),
            files: BTreeMap::new(),
            dirs: Vec::new(),
        }
    }

    /// Use a different package extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Add a text file. Parent directories are created automatically.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.with_bytes(path, contents.into().into_bytes())
    }

    /// Add a file with arbitrary bytes.
    pub fn with_bytes(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.into());
        self
    }

    /// Add an empty directory to the package.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Create the package on disk.
    pub fn build(self) -> BuiltTestPackage {
        let path = self
            .temp_dir
            .path()
            .join(format!("{}.{}", self.name, self.extension));
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("Failed to create package {}: {}", path.display(), e));

        for dir in &self.dirs {
            let full_path = path.join(dir);
            fs::create_dir_all(&full_path).unwrap_or_else(|e| {
                panic!("Failed to create directory {}: {}", full_path.display(), e)
            });
        }

        for (rel, contents) in &self.files {
            write_bytes(&path.join(rel), contents);
        }

        BuiltTestPackage {
            temp_dir: self.temp_dir,
            path,
        }
    }
}

/// A package created on disk.
pub struct BuiltTestPackage {
    temp_dir: TempDir,
    path: PathBuf,
}

impl BuiltTestPackage {
    /// The package directory itself.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The temp directory holding the package.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a file from the package.
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.path.join(path.as_ref());
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Write a file in the package (for modifying during tests).
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) {
        write_bytes(&self.path.join(path.as_ref()), contents.as_ref().as_bytes());
    }

    /// List the package's visible files as sorted `/`-separated paths.
    pub fn list_files(&self) -> Vec<String> {
        list_files(&self.path)
    }
}

/// A temporary data directory with a store and catalog wired together.
pub struct TestWorkspace {
    temp_dir: TempDir,
    kind: PackageKind,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            kind: PackageKind::default(),
        }
    }

    /// The data directory (`working/`, `versions/`, `checkouts/`, `snapshot.json`).
    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir().join("snapshot.json")
    }

    /// Open a history over this workspace; calling twice reloads from disk.
    pub async fn history(&self) -> CoreResult<VersionHistory<CatalogStore<JsonStorage>>> {
        let store = SnapshotStore::new(self.data_dir().to_path_buf(), self.kind.clone()).await?;
        let persistence = CatalogStore::new(JsonStorage::new(self.data_dir()));
        VersionHistory::open(store, persistence).await
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a file, creating parent directories.
pub fn write_bytes(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| {
            panic!(
                "Failed to create parent directory for {}: {}",
                path.display(),
                e
            )
        });
    }
    fs::write(path, contents)
        .unwrap_or_else(|e| panic!("Failed to write file {}: {}", path.display(), e));
}

/// Every non-hidden regular file under `root`, as sorted `/`-separated paths.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| packsync_util::path::slash_relative(e.path(), root))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_builder() {
        let package = TestPackage::new("Beat")
            .with_extension("band")
            .with_file("b.txt", "b")
            .with_file("Sub/a.txt", "a")
            .with_bytes("raw.bin", vec![0u8, 1, 2])
            .with_dir("Empty")
            .build();

        assert!(package.path().ends_with("Beat.band"));
        assert!(package.path().join("Empty").is_dir());
        assert_eq!(package.read_file("Sub/a.txt"), "a");
        assert_eq!(package.list_files(), vec!["Sub/a.txt", "b.txt", "raw.bin"]);
    }

    #[test]
    fn test_list_files_skips_hidden() {
        let package = TestPackage::new("Song")
            .with_file(".DS_Store", "x")
            .with_file("visible", "y")
            .build();
        assert_eq!(package.list_files(), vec!["visible"]);
    }
}
