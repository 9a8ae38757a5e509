//! Project, version and activity records.
//!
//! Everything here is plain data. The [`Catalog`] is the single value the
//! history manager edits and hands to persistence; records serialize with
//! camelCase keys and ISO-8601 timestamps.

use chrono::{DateTime, Utc};
use packsync_snapshot::Manifest;
use packsync_util::Identifier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The user on whose behalf a workflow runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A member's role within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: String,
    pub role: Role,
}

/// An immutable point in a project's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub message: String,
    pub manifest: Manifest,
    /// Location of the frozen snapshot tree.
    pub snapshot_path: PathBuf,
    pub creator_id: String,
    pub creator_name: String,
}

/// Where a project came from when it was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectOrigin {
    #[serde(rename_all = "camelCase")]
    Fork { project_id: String, version_id: String },
    #[serde(rename_all = "camelCase")]
    Merge {
        base_version_id: String,
        overlay_version_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,

    /// The package this project was imported from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,

    /// Opaque access token for `source_path`, carried but never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ProjectOrigin>,

    pub working_copy_path: PathBuf,
    pub owner_id: String,
    pub owner_name: String,

    #[serde(default)]
    pub members: Vec<Member>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Advisory only; nothing refuses to run while a project is locked.
    #[serde(default)]
    pub is_locked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,

    /// Newest first.
    #[serde(default)]
    pub versions: Vec<ProjectVersion>,
}

impl Project {
    pub fn version(&self, version_id: &str) -> Option<&ProjectVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    pub fn latest_version(&self) -> Option<&ProjectVersion> {
        self.versions.first()
    }

    /// Find a member by id, ignoring case.
    pub fn member(&self, user_id: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.user_id.to_lowercase() == user_id.to_lowercase())
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id.to_lowercase() == user_id.to_lowercase()
    }
}

/// One entry in the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl ActivityEvent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Identifier::activity(),
            timestamp: Utc::now(),
            title: title.into(),
            detail: None,
            project_id: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn for_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

/// All projects and the activity feed, as loaded and saved together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Newest first.
    pub projects: Vec<Project>,
    /// Newest first.
    pub activity: Vec<ActivityEvent>,
}

impl Catalog {
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    /// Find a version in any project.
    pub fn find_version(&self, version_id: &str) -> Option<(&Project, &ProjectVersion)> {
        self.projects
            .iter()
            .find_map(|p| p.version(version_id).map(|v| (p, v)))
    }

    /// Prepend an event to the feed.
    pub fn record(&mut self, event: ActivityEvent) {
        self.activity.insert(0, event);
    }

    /// Events belonging to one project, newest first.
    pub fn activity_for<'a>(
        &'a self,
        project_id: &'a str,
    ) -> impl Iterator<Item = &'a ActivityEvent> + 'a {
        self.activity
            .iter()
            .filter(move |e| e.project_id.as_deref() == Some(project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str) -> Project {
        let now = Utc::now();
        Project {
            id: id.to_string(),
            name: "Song".to_string(),
            source_path: None,
            source_access_token: Some("opaque".to_string()),
            origin: None,
            working_copy_path: PathBuf::from("/w"),
            owner_id: "Alice".to_string(),
            owner_name: "Alice".to_string(),
            members: vec![Member {
                user_id: "Alice".to_string(),
                role: Role::Owner,
            }],
            created_at: now,
            updated_at: now,
            is_locked: false,
            locked_by: None,
            versions: vec![ProjectVersion {
                id: "ver_1".to_string(),
                created_at: now,
                message: "first".to_string(),
                manifest: Manifest::default(),
                snapshot_path: PathBuf::from("/v"),
                creator_id: "Alice".to_string(),
                creator_name: "Alice".to_string(),
            }],
        }
    }

    #[test]
    fn test_member_lookup_ignores_case() {
        let p = project("prj_1");
        assert!(p.member("alice").is_some());
        assert!(p.is_owner("ALICE"));
        assert!(p.member("bob").is_none());
    }

    #[test]
    fn test_find_version_across_projects() {
        let mut catalog = Catalog::default();
        catalog.projects.push(project("prj_1"));
        let (p, v) = catalog.find_version("ver_1").unwrap();
        assert_eq!(p.id, "prj_1");
        assert_eq!(v.message, "first");
        assert!(catalog.find_version("ver_2").is_none());
    }

    #[test]
    fn test_record_prepends() {
        let mut catalog = Catalog::default();
        catalog.record(ActivityEvent::new("one").for_project("prj_1"));
        catalog.record(ActivityEvent::new("two"));
        assert_eq!(catalog.activity[0].title, "two");
        assert_eq!(catalog.activity_for("prj_1").count(), 1);
    }

    #[test]
    fn test_project_serializes_camel_case() {
        let json = serde_json::to_value(project("prj_1")).unwrap();
        assert!(json.get("workingCopyPath").is_some());
        assert_eq!(json["sourceAccessToken"], "opaque");
        assert_eq!(json["members"][0]["role"], "owner");
        assert!(json["createdAt"].as_str().unwrap().contains('T'));
        assert!(json.get("origin").is_none());
    }

    #[test]
    fn test_origin_round_trips() {
        let origin = ProjectOrigin::Fork {
            project_id: "prj_1".to_string(),
            version_id: "ver_1".to_string(),
        };
        let json = serde_json::to_value(&origin).unwrap();
        assert_eq!(json["kind"], "fork");
        assert_eq!(json["versionId"], "ver_1");
        let back: ProjectOrigin = serde_json::from_value(json).unwrap();
        assert_eq!(back, origin);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Editor"), Some(Role::Editor));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::Viewer.as_str(), "viewer");
    }
}
