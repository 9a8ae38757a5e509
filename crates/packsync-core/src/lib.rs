//! Core logic for packsync.
//!
//! This crate ties the snapshot engine to a persisted catalog of projects:
//! - Configuration management (global file, env content, `PACKSYNC_*` overrides)
//! - Project, version, membership and activity records
//! - Catalog persistence over a keyed document store
//! - The version history manager that runs every workflow
//! - The external editor collaborator

pub mod catalog;
pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod model;

pub use catalog::{CatalogStore, Persistence};
pub use config::Config;
pub use editor::{Editor, NoopEditor};
pub use error::{ConfigError, CoreError, CoreResult};
pub use history::{
    ImportOptions, MergedProject, Outcome, VersionHistory, WorkingCopyMerge, WorkingCopyStatus,
};
pub use model::{
    ActivityEvent, Actor, Catalog, Member, Project, ProjectOrigin, ProjectVersion, Role,
};
