//! File-level overlay merge.
//!
//! Copies an overlay tree into a base tree. Paths that exist on both sides
//! are conflicts; the [`ConflictPolicy`] decides which side keeps the
//! original name and which is renamed beside it. File contents are never
//! inspected.

use crate::error::{IoResultExt, SnapshotError, SnapshotResult};
use crate::order::natural_cmp;
use packsync_util::path::is_hidden_name;
use packsync_util::TimingGuard;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How to resolve an entry that exists in both trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictPolicy {
    /// Base keeps the path; the overlay copy lands beside it with `__fromVersion`.
    KeepBaseRenameOverlay,
    /// Overlay takes the path; the base entry is renamed with `__fromA`.
    KeepOverlayRenameBase,
}

impl ConflictPolicy {
    /// The policy used when folding a version into a working copy.
    pub const KEEP_WORKING_COPY: ConflictPolicy = ConflictPolicy::KeepBaseRenameOverlay;

    /// Suffix appended to the stem of the displaced entry.
    pub fn suffix(&self) -> &'static str {
        match self {
            ConflictPolicy::KeepBaseRenameOverlay => "__fromVersion",
            ConflictPolicy::KeepOverlayRenameBase => "__fromA",
        }
    }

    /// Parse a policy from its CLI spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "keep-base" | "keep-base-rename-overlay" => Some(Self::KeepBaseRenameOverlay),
            "keep-overlay" | "keep-overlay-rename-base" => Some(Self::KeepOverlayRenameBase),
            _ => None,
        }
    }
}

/// Which side of a conflict was moved off the original path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Displaced {
    Base,
    Overlay,
}

/// One path that existed in both trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConflict {
    /// Relative path both trees had.
    pub path: String,
    /// The side that lost the original path.
    pub displaced: Displaced,
    /// Relative path the displaced entry now lives at.
    pub renamed_to: String,
}

/// What a merge did to the base tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Files copied in without conflict.
    pub added: Vec<String>,
    /// Conflicts and how they were resolved.
    pub conflicts: Vec<MergeConflict>,
    /// Bytes copied from the overlay.
    #[serde(default)]
    pub bytes: u64,
}

impl MergeReport {
    /// One-line summary for activity details and status output.
    pub fn summary(&self) -> String {
        format!(
            "{} file(s) added, {} conflict(s)",
            self.added.len(),
            self.conflicts.len()
        )
    }
}

/// Merge `overlay` into `base` on a blocking worker.
///
/// Not transactional: on error `base` may be partially merged.
pub async fn merge(
    base: impl Into<PathBuf>,
    overlay: impl Into<PathBuf>,
    policy: ConflictPolicy,
) -> SnapshotResult<MergeReport> {
    let base = base.into();
    let overlay = overlay.into();
    tokio::task::spawn_blocking(move || merge_blocking(&base, &overlay, policy)).await?
}

/// Merge `overlay` into `base` on the current thread.
pub fn merge_blocking(
    base: &Path,
    overlay: &Path,
    policy: ConflictPolicy,
) -> SnapshotResult<MergeReport> {
    for dir in [base, overlay] {
        if !dir.is_dir() {
            return Err(SnapshotError::NotDirectory(dir.to_path_buf()));
        }
    }
    if base.starts_with(overlay) || overlay.starts_with(base) {
        return Err(SnapshotError::InvalidTarget {
            src: overlay.to_path_buf(),
            dst: base.to_path_buf(),
        });
    }

    let mut timing = TimingGuard::merge(format!("{} -> {}", overlay.display(), base.display()));
    let mut report = MergeReport::default();
    merge_dir(overlay, base, "", policy, &mut report)?;
    timing.record(report.added.len() + report.conflicts.len(), report.bytes);

    info!(
        base = %base.display(),
        overlay = %overlay.display(),
        ?policy,
        added = report.added.len(),
        conflicts = report.conflicts.len(),
        "Merged trees"
    );
    Ok(report)
}

fn merge_dir(
    overlay_dir: &Path,
    base_dir: &Path,
    relative: &str,
    policy: ConflictPolicy,
    report: &mut MergeReport,
) -> SnapshotResult<()> {
    // Conflicts are decided against the base as it was before this level
    // was merged.
    let base_names = listing(base_dir)?;
    let mut children = Vec::new();
    for entry in fs::read_dir(overlay_dir).at(overlay_dir)? {
        let entry = entry.at(overlay_dir)?;
        if is_hidden_name(&entry.file_name()) {
            continue;
        }
        children.push(entry);
    }
    children.sort_by(|a, b| {
        natural_cmp(
            &a.file_name().to_string_lossy(),
            &b.file_name().to_string_lossy(),
        )
    });
    let overlay_names: HashSet<OsString> = children.iter().map(|c| c.file_name()).collect();

    for child in children {
        let name = child.file_name();
        let src = child.path();
        let dst = base_dir.join(&name);
        let child_relative = join_relative(relative, &name);
        let file_type = child.file_type().at(&src)?;
        let existing = if base_names.contains(&name) {
            existing_entry(&dst)?
        } else {
            None
        };

        if file_type.is_dir() {
            match existing {
                None => {
                    fs::create_dir(&dst).at(&dst)?;
                    merge_dir(&src, &dst, &child_relative, policy, report)?;
                }
                Some(meta) if meta.is_dir() => {
                    merge_dir(&src, &dst, &child_relative, policy, report)?;
                }
                Some(_) => {
                    // A base file sits where the overlay has a directory
                    let aside = free_name(base_dir, &name, policy.suffix(), &overlay_names)?;
                    let aside_relative = join_relative(relative, aside.file_name().unwrap_or_default());
                    let displaced = match policy {
                        ConflictPolicy::KeepBaseRenameOverlay => {
                            fs::create_dir(&aside).at(&aside)?;
                            merge_dir(&src, &aside, &aside_relative, policy, report)?;
                            Displaced::Overlay
                        }
                        ConflictPolicy::KeepOverlayRenameBase => {
                            fs::rename(&dst, &aside).at(&dst)?;
                            fs::create_dir(&dst).at(&dst)?;
                            merge_dir(&src, &dst, &child_relative, policy, report)?;
                            Displaced::Base
                        }
                    };
                    record_conflict(report, child_relative, displaced, aside_relative);
                }
            }
        } else if file_type.is_file() {
            match existing {
                None => {
                    report.bytes += fs::copy(&src, &dst).at(&src)?;
                    debug!(path = %child_relative, "Added");
                    report.added.push(child_relative);
                }
                Some(_) => {
                    let aside = free_name(base_dir, &name, policy.suffix(), &overlay_names)?;
                    let aside_relative = join_relative(relative, aside.file_name().unwrap_or_default());
                    let displaced = match policy {
                        ConflictPolicy::KeepBaseRenameOverlay => {
                            report.bytes += fs::copy(&src, &aside).at(&src)?;
                            Displaced::Overlay
                        }
                        ConflictPolicy::KeepOverlayRenameBase => {
                            fs::rename(&dst, &aside).at(&dst)?;
                            report.bytes += fs::copy(&src, &dst).at(&src)?;
                            Displaced::Base
                        }
                    };
                    record_conflict(report, child_relative, displaced, aside_relative);
                }
            }
        } else {
            debug!(path = %src.display(), "Skipping non-regular entry");
        }
    }

    Ok(())
}

fn record_conflict(
    report: &mut MergeReport,
    path: String,
    displaced: Displaced,
    renamed_to: String,
) {
    debug!(path = %path, renamed_to = %renamed_to, ?displaced, "Resolved conflict");
    report.conflicts.push(MergeConflict {
        path,
        displaced,
        renamed_to,
    });
}

fn existing_entry(path: &Path) -> SnapshotResult<Option<fs::Metadata>> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SnapshotError::io(path, e)),
    }
}

fn join_relative(parent: &str, name: impl AsRef<std::ffi::OsStr>) -> String {
    let name = name.as_ref().to_string_lossy();
    if parent.is_empty() {
        name.into_owned()
    } else {
        format!("{parent}/{name}")
    }
}

/// Names of the entries currently in `dir`; empty when `dir` is missing.
fn listing(dir: &Path) -> SnapshotResult<HashSet<OsString>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(SnapshotError::io(dir, e)),
    };
    entries
        .map(|entry| entry.map(|e| e.file_name()).at(dir))
        .collect()
}

/// First sibling name of the form `<stem><suffix>[-N][.<ext>]` that is
/// neither on disk nor still to come from the overlay.
fn free_name(
    dir: &Path,
    name: &OsString,
    suffix: &str,
    reserved: &HashSet<OsString>,
) -> SnapshotResult<PathBuf> {
    let original = Path::new(name);
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = if counter == 1 {
            format!("{stem}{suffix}{extension}")
        } else {
            format!("{stem}{suffix}-{counter}{extension}")
        };
        let path = dir.join(&candidate);
        if !reserved.contains(OsStr::new(&candidate)) && existing_entry(&path)?.is_none() {
            return Ok(path);
        }
        counter += 1;
    }
}
