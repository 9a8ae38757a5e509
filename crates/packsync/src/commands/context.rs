//! The state every command runs against.

use packsync_core::{Actor, CatalogStore, Config, CoreError, Project, VersionHistory};
use packsync_snapshot::SnapshotStore;
use packsync_storage::JsonStorage;
use packsync_util::{IdPrefix, Identifier};
use std::path::PathBuf;
use tracing::debug;

pub type History = VersionHistory<CatalogStore<JsonStorage>>;

/// A loaded history plus who is running the command.
pub struct Context {
    pub history: History,
    pub actor: Actor,
    pub json: bool,
}

impl Context {
    /// Open the data directory named by `config`.
    pub async fn open(config: &Config, json: bool) -> anyhow::Result<Self> {
        let data_dir = config.resolved_data_dir()?;
        debug!(data_dir = %data_dir.display(), "Opening data directory");

        let store = SnapshotStore::new(data_dir.clone(), config.package_kind()).await?;
        let persistence = CatalogStore::new(JsonStorage::new(data_dir));
        let history = VersionHistory::open(store, persistence).await?;

        Ok(Self {
            history,
            actor: config.actor(),
            json,
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        self.history.store().root().to_path_buf()
    }

    /// Resolve a project by id, name (ignoring case) or unique id prefix.
    pub fn project_id(&self, query: &str) -> anyhow::Result<String> {
        let projects = self.history.projects();

        if let Some(p) = projects.iter().find(|p| p.id == query) {
            return Ok(p.id.clone());
        }

        let needle = query.to_lowercase();
        let by_name: Vec<&Project> = projects
            .iter()
            .filter(|p| p.name.to_lowercase() == needle)
            .collect();
        let candidates = if by_name.is_empty() {
            projects
                .iter()
                .filter(|p| p.id.starts_with(query))
                .collect()
        } else {
            by_name
        };

        match candidates.as_slice() {
            [] if Identifier::prefix_of(query) == Some(IdPrefix::Version) => {
                anyhow::bail!("'{query}' is a version id; pass the project it belongs to")
            }
            [] => Err(CoreError::ProjectNotFound(query.to_string()).into()),
            [only] => Ok(only.id.clone()),
            many => anyhow::bail!(
                "'{query}' matches {} projects: {}",
                many.len(),
                many.iter()
                    .map(|p| p.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Resolve a version of one project by id, unique id prefix, or `latest`.
    pub fn version_id(&self, project_id: &str, query: &str) -> anyhow::Result<String> {
        let project = self.history.project(project_id)?;
        if query.eq_ignore_ascii_case("latest") {
            return project
                .latest_version()
                .map(|v| v.id.clone())
                .ok_or_else(|| CoreError::VersionNotFound(query.to_string()).into());
        }
        pick_version(
            project.versions.iter().map(|v| v.id.as_str()),
            query,
        )
    }

    /// Resolve a version in any project by id or unique id prefix.
    pub fn any_version_id(&self, query: &str) -> anyhow::Result<String> {
        pick_version(
            self.history
                .projects()
                .iter()
                .flat_map(|p| p.versions.iter().map(|v| v.id.as_str())),
            query,
        )
    }
}

fn pick_version<'a>(ids: impl Iterator<Item = &'a str>, query: &str) -> anyhow::Result<String> {
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(query)).collect();
    if let Some(exact) = matches.iter().find(|id| **id == query) {
        return Ok(exact.to_string());
    }
    match matches.as_slice() {
        [] => Err(CoreError::VersionNotFound(query.to_string()).into()),
        [only] => Ok(only.to_string()),
        many => anyhow::bail!("'{query}' matches {} versions", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_version_prefix() {
        let ids = ["ver_01AAA", "ver_01AAB", "ver_01BBB"];
        assert_eq!(
            pick_version(ids.iter().copied(), "ver_01B").unwrap(),
            "ver_01BBB"
        );
        assert!(pick_version(ids.iter().copied(), "ver_01AA").is_err());
        assert_eq!(
            pick_version(ids.iter().copied(), "ver_01AAA").unwrap(),
            "ver_01AAA"
        );
        assert!(pick_version(ids.iter().copied(), "ver_9").is_err());
    }
}
