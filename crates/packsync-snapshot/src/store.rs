//! Snapshot storage implementation.

use crate::error::{IoResultExt, SnapshotError, SnapshotResult};
use crate::package::PackageKind;
use packsync_util::TimingGuard;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The three kinds of tree the store keeps per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// The single mutable working copy.
    Working,
    /// Immutable version snapshots.
    Versions,
    /// Disposable materializations of versions.
    Checkouts,
}

impl Namespace {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Namespace::Working => "working",
            Namespace::Versions => "versions",
            Namespace::Checkouts => "checkouts",
        }
    }
}

/// Storage for package trees.
///
/// Trees are stored as plain directory copies:
/// ```text
/// root/
///   working/<project_id>/<name>.<ext>/                  # mutable
///   versions/<project_id>/<version_id>/<name>.<ext>/    # immutable
///   checkouts/<project_id>/<version_id>/<name>.<ext>/   # disposable
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Base directory for all trees.
    root: PathBuf,

    /// Package type; decides the tree directory extension.
    kind: PackageKind,
}

impl SnapshotStore {
    /// Create a store rooted at `root`, creating the namespace directories.
    pub async fn new(root: PathBuf, kind: PackageKind) -> SnapshotResult<Self> {
        for ns in [Namespace::Working, Namespace::Versions, Namespace::Checkouts] {
            let dir = root.join(ns.dir_name());
            fs::create_dir_all(&dir).await.at(&dir)?;
        }

        debug!(root = %root.display(), ext = kind.extension(), "Opened snapshot store");
        Ok(Self { root, kind })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> &PackageKind {
        &self.kind
    }

    /// `working/<project_id>/<name>.<ext>`
    pub fn working_copy_path(&self, project_id: &str, name: &str) -> PathBuf {
        self.root
            .join(Namespace::Working.dir_name())
            .join(project_id)
            .join(self.kind.file_name(name))
    }

    /// `versions/<project_id>/<version_id>/<name>.<ext>`
    pub fn version_path(&self, project_id: &str, version_id: &str, name: &str) -> PathBuf {
        self.version_dir(project_id, version_id)
            .join(self.kind.file_name(name))
    }

    /// `checkouts/<project_id>/<version_id>/<name>.<ext>`
    pub fn checkout_path(&self, project_id: &str, version_id: &str, name: &str) -> PathBuf {
        self.root
            .join(Namespace::Checkouts.dir_name())
            .join(project_id)
            .join(version_id)
            .join(self.kind.file_name(name))
    }

    /// Replace `dst` with a full copy of `src`.
    ///
    /// `dst` is deleted first if present. Never pass a version snapshot as
    /// `dst`; use [`SnapshotStore::freeze`] to create one.
    pub async fn materialize(&self, dst: &Path, src: &Path) -> SnapshotResult<()> {
        let dst = dst.to_path_buf();
        let src = src.to_path_buf();
        tokio::task::spawn_blocking(move || materialize_blocking(&dst, &src)).await?
    }

    /// Seed a project's working copy from `src`, replacing any existing one.
    pub async fn seed_working_copy(
        &self,
        src: &Path,
        project_id: &str,
        name: &str,
    ) -> SnapshotResult<PathBuf> {
        let dst = self.working_copy_path(project_id, name);
        self.materialize(&dst, src).await?;
        info!(project = project_id, path = %dst.display(), "Seeded working copy");
        Ok(dst)
    }

    /// Freeze `src` into a new immutable version snapshot.
    ///
    /// Fails with [`SnapshotError::SnapshotExists`] if the version already
    /// has a snapshot on disk.
    pub async fn freeze(
        &self,
        src: &Path,
        project_id: &str,
        version_id: &str,
        name: &str,
    ) -> SnapshotResult<PathBuf> {
        let version_dir = self.version_dir(project_id, version_id);
        if fs::try_exists(&version_dir).await.at(&version_dir)? {
            return Err(SnapshotError::SnapshotExists(version_dir));
        }

        let dst = self.version_path(project_id, version_id, name);
        self.materialize(&dst, src).await?;
        info!(
            project = project_id,
            version = version_id,
            "Created version snapshot"
        );
        Ok(dst)
    }

    /// Materialize a disposable checkout of a version snapshot.
    pub async fn checkout(
        &self,
        snapshot: &Path,
        project_id: &str,
        version_id: &str,
        name: &str,
    ) -> SnapshotResult<PathBuf> {
        let dst = self.checkout_path(project_id, version_id, name);
        self.materialize(&dst, snapshot).await?;
        info!(project = project_id, version = version_id, path = %dst.display(), "Checked out version");
        Ok(dst)
    }

    /// Delete a version's snapshot and any checkout of it.
    pub async fn remove_version(&self, project_id: &str, version_id: &str) -> SnapshotResult<()> {
        remove_if_present(&self.version_dir(project_id, version_id)).await?;
        let checkout = self
            .root
            .join(Namespace::Checkouts.dir_name())
            .join(project_id)
            .join(version_id);
        remove_if_present(&checkout).await?;
        info!(project = project_id, version = version_id, "Deleted version snapshot");
        Ok(())
    }

    /// Delete every tree belonging to a project.
    pub async fn remove_project(&self, project_id: &str) -> SnapshotResult<()> {
        for ns in [Namespace::Working, Namespace::Versions, Namespace::Checkouts] {
            remove_if_present(&self.root.join(ns.dir_name()).join(project_id)).await?;
        }
        info!(project = project_id, "Deleted project trees");
        Ok(())
    }

    /// Delete all checkouts of a project. Returns how many were removed.
    pub async fn clear_checkouts(&self, project_id: &str) -> SnapshotResult<usize> {
        let dir = self
            .root
            .join(Namespace::Checkouts.dir_name())
            .join(project_id);

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SnapshotError::io(&dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.at(&dir)? {
            remove_if_present(&entry.path()).await?;
            removed += 1;
        }

        if removed > 0 {
            info!(project = project_id, removed, "Cleared checkouts");
        }
        Ok(removed)
    }

    /// Best-effort removal of a tree created by a workflow that later failed.
    pub async fn discard(&self, path: &Path) {
        let target = path.parent().unwrap_or(path);
        // Only ever discard inside the store
        if !target.starts_with(&self.root) || target == self.root {
            return;
        }
        if let Err(e) = remove_if_present(target).await {
            warn!(path = %target.display(), error = %e, "Failed to discard tree");
        }
    }

    fn version_dir(&self, project_id: &str, version_id: &str) -> PathBuf {
        self.root
            .join(Namespace::Versions.dir_name())
            .join(project_id)
            .join(version_id)
    }
}

async fn remove_if_present(path: &Path) -> SnapshotResult<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await.at(path),
        Ok(_) => fs::remove_file(path).await.at(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SnapshotError::io(path, e)),
    }
}

/// Delete `dst` if present, then copy `src` to `dst` wholesale.
pub fn materialize_blocking(dst: &Path, src: &Path) -> SnapshotResult<()> {
    if !src.is_dir() {
        return Err(SnapshotError::NotDirectory(src.to_path_buf()));
    }
    if dst.starts_with(src) || src.starts_with(dst) {
        return Err(SnapshotError::InvalidTarget {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        });
    }

    match std::fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(dst).at(dst)?,
        Ok(_) => std::fs::remove_file(dst).at(dst)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(SnapshotError::io(dst, e)),
    }

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).at(parent)?;
    }

    copy_tree(src, dst)
}

/// Copy a directory tree, hidden entries included.
///
/// Symbolic links are recreated as links on Unix and skipped elsewhere.
pub fn copy_tree(src: &Path, dst: &Path) -> SnapshotResult<()> {
    let mut timing = TimingGuard::copy(format!("{} -> {}", src.display(), dst.display()));
    let (mut files, mut bytes) = (0usize, 0u64);

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            SnapshotError::io(path, e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| SnapshotError::InvalidTarget {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
            })?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target).at(&target)?;
        } else if file_type.is_file() {
            bytes += std::fs::copy(entry.path(), &target).at(entry.path())?;
            files += 1;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        }
    }

    timing.record(files, bytes);
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> SnapshotResult<()> {
    let link = std::fs::read_link(src).at(src)?;
    std::os::unix::fs::symlink(link, dst).at(dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dst: &Path) -> SnapshotResult<()> {
    warn!(path = %src.display(), "Skipping symbolic link");
    Ok(())
}
