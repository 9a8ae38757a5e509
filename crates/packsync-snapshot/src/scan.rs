//! Manifest scanning.
//!
//! A scan walks every directory under the package root (nested packages
//! included), skips hidden entries, and hashes each regular file.

use crate::error::{IoResultExt, SnapshotError, SnapshotResult};
use crate::hash::hash_file;
use crate::manifest::{FileEntry, Manifest};
use chrono::{DateTime, Utc};
use packsync_util::path::{is_hidden_name, slash_relative};
use packsync_util::TimingGuard;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Scan a package directory on a blocking worker.
///
/// The returned future always runs the scan to completion or failure.
pub async fn scan(root: impl Into<PathBuf>) -> SnapshotResult<Manifest> {
    let root = root.into();
    tokio::task::spawn_blocking(move || scan_blocking(&root)).await?
}

/// Scan a package directory on the current thread.
pub fn scan_blocking(root: &Path) -> SnapshotResult<Manifest> {
    if !root.is_dir() {
        return Err(SnapshotError::NotDirectory(root.to_path_buf()));
    }

    let mut timing = TimingGuard::scan(root.display().to_string());
    let mut entries = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden_name(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        entries.push(file_entry(root, entry.path())?);
    }

    timing.record(entries.len(), entries.iter().map(|e| e.size).sum());
    debug!(root = %root.display(), files = entries.len(), "Scanned package");
    Ok(Manifest::from_entries(entries))
}

fn file_entry(root: &Path, path: &Path) -> SnapshotResult<FileEntry> {
    let metadata = std::fs::metadata(path).at(path)?;
    let modified = metadata.modified().at(path)?;
    let relative_path = slash_relative(path, root).ok_or_else(|| {
        SnapshotError::io(path, std::io::Error::other("path is outside the scan root"))
    })?;

    Ok(FileEntry {
        relative_path,
        size: metadata.len(),
        modified: DateTime::<Utc>::from(modified),
        hash: hash_file(path)?,
    })
}
