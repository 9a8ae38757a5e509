//! Manifest data structures.

use crate::order::natural_cmp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Deref;

/// One file within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Path relative to the package root, `/`-separated.
    pub relative_path: String,

    /// Size in bytes.
    pub size: u64,

    /// Last modification time.
    pub modified: DateTime<Utc>,

    /// Lowercase hex SHA-256 of the contents.
    pub hash: String,
}

impl FileEntry {
    /// Whether two entries describe the same bytes at the same path.
    ///
    /// Modification time is ignored: copies and other filesystems may
    /// legitimately report a different one.
    pub fn same_content(&self, other: &FileEntry) -> bool {
        self.relative_path == other.relative_path
            && self.size == other.size
            && self.hash == other.hash
    }
}

/// An ordered list of the files in a package tree.
///
/// Entries are unique by path and sorted with [`natural_cmp`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Vec<FileEntry>);

impl Manifest {
    /// Build a manifest from entries in any order.
    pub fn from_entries(mut entries: Vec<FileEntry>) -> Self {
        entries.sort_by(|a, b| natural_cmp(&a.relative_path, &b.relative_path));
        entries.dedup_by(|a, b| a.relative_path == b.relative_path);
        Self(entries)
    }

    /// Look up an entry by relative path.
    pub fn get(&self, relative_path: &str) -> Option<&FileEntry> {
        self.0
            .binary_search_by(|e| natural_cmp(&e.relative_path, relative_path))
            .ok()
            .map(|i| &self.0[i])
    }

    /// Sum of all file sizes.
    pub fn total_size(&self) -> u64 {
        self.0.iter().map(|e| e.size).sum()
    }

    /// The `(path, size, hash)` triples, for comparisons that ignore mtime.
    pub fn content_triples(&self) -> Vec<(&str, u64, &str)> {
        self.0
            .iter()
            .map(|e| (e.relative_path.as_str(), e.size, e.hash.as_str()))
            .collect()
    }

    /// Compare this manifest (older) against `newer`.
    pub fn diff(&self, newer: &Manifest) -> ManifestDiff {
        ManifestDiff::between(self, newer)
    }
}

impl Deref for Manifest {
    type Target = [FileEntry];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// File-level differences between two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDiff {
    /// Paths present only in the newer manifest.
    pub added: Vec<String>,

    /// Paths present only in the older manifest.
    pub removed: Vec<String>,

    /// Paths present in both whose size or hash changed.
    pub modified: Vec<String>,
}

impl ManifestDiff {
    /// Compute the differences going from `old` to `new`.
    pub fn between(old: &Manifest, new: &Manifest) -> Self {
        let old_by_path: HashMap<&str, &FileEntry> = old
            .iter()
            .map(|e| (e.relative_path.as_str(), e))
            .collect();
        let new_by_path: HashMap<&str, &FileEntry> = new
            .iter()
            .map(|e| (e.relative_path.as_str(), e))
            .collect();

        let mut diff = ManifestDiff::default();

        for entry in new.iter() {
            match old_by_path.get(entry.relative_path.as_str()) {
                None => diff.added.push(entry.relative_path.clone()),
                Some(previous) if !previous.same_content(entry) => {
                    diff.modified.push(entry.relative_path.clone())
                }
                Some(_) => {}
            }
        }

        diff.removed = old
            .iter()
            .filter(|e| !new_by_path.contains_key(e.relative_path.as_str()))
            .map(|e| e.relative_path.clone())
            .collect();

        diff
    }

    /// Whether the two manifests describe the same content.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, size: u64, hash: &str) -> FileEntry {
        FileEntry {
            relative_path: path.to_string(),
            size,
            modified: Utc::now(),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn test_from_entries_sorts_naturally() {
        let manifest = Manifest::from_entries(vec![
            entry("Media/take10.wav", 1, "a"),
            entry("media/take2.wav", 1, "b"),
            entry("ProjectData", 1, "c"),
        ]);
        let paths: Vec<&str> = manifest.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["media/take2.wav", "Media/take10.wav", "ProjectData"]
        );
    }

    #[test]
    fn test_get() {
        let manifest = Manifest::from_entries(vec![
            entry("b.txt", 2, "bb"),
            entry("a.txt", 1, "aa"),
        ]);
        assert_eq!(manifest.get("b.txt").unwrap().hash, "bb");
        assert!(manifest.get("c.txt").is_none());
        assert_eq!(manifest.total_size(), 3);
    }

    #[test]
    fn test_diff() {
        let old = Manifest::from_entries(vec![
            entry("keep.txt", 1, "k"),
            entry("gone.txt", 1, "g"),
            entry("edit.txt", 1, "e1"),
        ]);
        let new = Manifest::from_entries(vec![
            entry("keep.txt", 1, "k"),
            entry("edit.txt", 1, "e2"),
            entry("new.txt", 1, "n"),
        ]);

        let diff = old.diff(&new);
        assert_eq!(diff.added, vec!["new.txt"]);
        assert_eq!(diff.removed, vec!["gone.txt"]);
        assert_eq!(diff.modified, vec!["edit.txt"]);
        assert!(!diff.is_empty());
        assert!(new.diff(&new).is_empty());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let manifest = Manifest::from_entries(vec![entry("a.txt", 1, "aa")]);
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["relativePath"], "a.txt");
    }
}
