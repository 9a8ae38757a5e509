//! Package snapshots for packsync.
//!
//! This crate provides the tree-level machinery behind project versioning:
//! - Manifest scanning with streaming SHA-256 hashes
//! - Natural, case-insensitive path ordering
//! - Working copy / version snapshot / checkout storage
//! - File-level overlay merges with a conflict policy
//!
//! # Example
//!
//! ```no_run
//! use packsync_snapshot::{merge, scan, ConflictPolicy, PackageKind, SnapshotStore};
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SnapshotStore::new(
//!     PathBuf::from("/data/packsync"),
//!     PackageKind::new("logicx"),
//! ).await?;
//!
//! let source = Path::new("/music/Song.logicx");
//! store.kind().validate(source)?;
//! let working = store.seed_working_copy(source, "prj_1", "Song").await?;
//! let manifest = scan(&working).await?;
//! let snapshot = store.freeze(&working, "prj_1", "ver_1", "Song").await?;
//!
//! // Fold the snapshot back in; the working copy wins conflicts
//! let report = merge(&working, &snapshot, ConflictPolicy::KEEP_WORKING_COPY).await?;
//! println!("{} files, {}", manifest.len(), report.summary());
//! # Ok(())
//! # }
//! ```

mod error;
pub mod hash;
mod manifest;
mod merge;
pub mod order;
mod package;
mod scan;
mod store;

pub use error::{SnapshotError, SnapshotResult};
pub use manifest::{FileEntry, Manifest, ManifestDiff};
pub use merge::{merge, merge_blocking, ConflictPolicy, Displaced, MergeConflict, MergeReport};
pub use package::PackageKind;
pub use scan::{scan, scan_blocking};
pub use store::{copy_tree, materialize_blocking, Namespace, SnapshotStore};
