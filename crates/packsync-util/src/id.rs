//! Prefixed ULID identifiers.
//!
//! Every id reads `prefix_ulid`, e.g. `prj_01hqxyz...` for a project or
//! `ver_01hqxyz...` for a version. ULIDs sort by creation time, so newer
//! ids compare greater.

use ulid::Ulid;

/// What an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    Project,
    Version,
    Activity,
}

impl IdPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Project => "prj",
            IdPrefix::Version => "ver",
            IdPrefix::Activity => "act",
        }
    }
}

/// Identifier generation.
pub struct Identifier;

impl Identifier {
    /// A fresh identifier. Version ids are unique across all projects.
    pub fn new(prefix: IdPrefix) -> String {
        format!("{}_{}", prefix.as_str(), Ulid::new().to_string().to_lowercase())
    }

    pub fn project() -> String {
        Self::new(IdPrefix::Project)
    }

    pub fn version() -> String {
        Self::new(IdPrefix::Version)
    }

    pub fn activity() -> String {
        Self::new(IdPrefix::Activity)
    }

    /// The kind named by a well-formed identifier, or by a prefix of one
    /// such as `ver_01h`.
    pub fn prefix_of(id: &str) -> Option<IdPrefix> {
        let (prefix, _) = id.split_once('_')?;
        [IdPrefix::Project, IdPrefix::Version, IdPrefix::Activity]
            .into_iter()
            .find(|p| p.as_str() == prefix)
    }
}
