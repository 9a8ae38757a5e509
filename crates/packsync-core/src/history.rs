//! The version history manager.
//!
//! [`VersionHistory`] drives every workflow. It owns the in-memory
//! [`Catalog`] and the [`SnapshotStore`], and each mutating workflow follows
//! the same shape:
//!
//! 1. Look up everything it needs, failing with a not-found error before
//!    touching disk.
//! 2. Do the filesystem work (seed, merge, scan, freeze) on blocking workers.
//! 3. Build the next catalog value, save it, and only then swap it in.
//!
//! If any step fails the in-memory catalog is unchanged and trees the
//! workflow created are removed again.

use crate::catalog::Persistence;
use crate::editor::Editor;
use crate::error::{CoreError, CoreResult};
use crate::model::{
    ActivityEvent, Actor, Catalog, Member, Project, ProjectOrigin, ProjectVersion, Role,
};
use chrono::Utc;
use packsync_snapshot::hash::hash_file;
use packsync_snapshot::{
    merge, scan, ConflictPolicy, Manifest, ManifestDiff, MergeReport, SnapshotError,
    SnapshotStore,
};
use packsync_util::Identifier;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Largest file [`VersionHistory::file_diff`] reads into memory.
pub const MAX_DIFF_BYTES: u64 = 8 * 1024 * 1024;

/// What a workflow produced, plus the activity it recorded.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<ActivityEvent>,
}

impl<T> Outcome<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Optional settings for [`VersionHistory::import`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Project name; defaults to the package's file stem.
    pub name: Option<String>,
    /// Opaque token granting access to the source, stored as-is.
    pub access_token: Option<String>,
    /// Message of the first version.
    pub message: Option<String>,
}

/// A project created by merging two versions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedProject {
    pub project: Project,
    pub report: MergeReport,
}

/// The result of folding a version into a working copy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingCopyMerge {
    pub report: MergeReport,
    /// The working copy as scanned after the merge.
    pub manifest: Manifest,
}

/// The working copy compared with the newest version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingCopyStatus {
    pub manifest: Manifest,
    pub base_version_id: Option<String>,
    pub changes: ManifestDiff,
}

impl WorkingCopyStatus {
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }
}

struct ProjectTrees {
    working: PathBuf,
    version: ProjectVersion,
    report: Option<MergeReport>,
}

/// Owns the catalog and drives every workflow.
pub struct VersionHistory<P> {
    store: SnapshotStore,
    persistence: P,
    catalog: Catalog,
}

impl<P: Persistence> VersionHistory<P> {
    /// Load the catalog and take ownership of the store.
    pub async fn open(store: SnapshotStore, persistence: P) -> CoreResult<Self> {
        let catalog = persistence.load().await?;
        info!(
            root = %store.root().display(),
            projects = catalog.projects.len(),
            "Opened version history"
        );
        Ok(Self {
            store,
            persistence,
            catalog,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// All projects, newest first.
    pub fn projects(&self) -> &[Project] {
        &self.catalog.projects
    }

    /// The activity feed, newest first.
    pub fn activity(&self) -> &[ActivityEvent] {
        &self.catalog.activity
    }

    pub fn project(&self, project_id: &str) -> CoreResult<&Project> {
        self.catalog
            .project(project_id)
            .ok_or_else(|| CoreError::ProjectNotFound(project_id.to_string()))
    }

    fn project_version(
        &self,
        project_id: &str,
        version_id: &str,
    ) -> CoreResult<(&Project, &ProjectVersion)> {
        let project = self.project(project_id)?;
        let version = project
            .version(version_id)
            .ok_or_else(|| CoreError::VersionNotFound(version_id.to_string()))?;
        Ok((project, version))
    }

    fn find_version(&self, version_id: &str) -> CoreResult<(&Project, &ProjectVersion)> {
        self.catalog
            .find_version(version_id)
            .ok_or_else(|| CoreError::VersionNotFound(version_id.to_string()))
    }

    // ---- Workflows that create projects ----

    /// Import a package as a new project with one version.
    pub async fn import(
        &mut self,
        source: &Path,
        options: ImportOptions,
        actor: &Actor,
    ) -> CoreResult<Outcome<Project>> {
        let kind = self.store.kind().clone();
        kind.validate(source)?;

        let name = options
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| kind.display_name(source));
        let message = options
            .message
            .unwrap_or_else(|| "Initial import".to_string());
        let project_id = Identifier::project();

        let trees = self
            .build_project_trees(&project_id, &name, source, None, message, actor)
            .await?;

        let mut project = new_project(&project_id, &name, &trees, actor);
        project.source_path = Some(source.to_path_buf());
        project.source_access_token = options.access_token;

        let event = ActivityEvent::new(format!("{} imported {}", actor.name, name))
            .with_detail(source.display().to_string())
            .for_project(&project_id);

        self.insert_project(project, event).await
    }

    /// Start a new project owned by `actor` from any existing version.
    pub async fn fork(
        &mut self,
        version_id: &str,
        name: Option<String>,
        actor: &Actor,
    ) -> CoreResult<Outcome<Project>> {
        let (source, version) = self.find_version(version_id)?;
        let source_id = source.id.clone();
        let source_name = source.name.clone();
        let snapshot = version.snapshot_path.clone();

        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{source_name} fork"));
        let message = format!("Forked from {source_name} at {version_id}");
        let project_id = Identifier::project();

        let trees = self
            .build_project_trees(&project_id, &name, &snapshot, None, message, actor)
            .await?;

        let mut project = new_project(&project_id, &name, &trees, actor);
        project.origin = Some(ProjectOrigin::Fork {
            project_id: source_id,
            version_id: version_id.to_string(),
        });

        let event = ActivityEvent::new(format!("{} forked {}", actor.name, source_name))
            .with_detail(format!("New project {name}"))
            .for_project(&project_id);

        self.insert_project(project, event).await
    }

    /// Combine two versions into a new project.
    ///
    /// The working copy starts as `base_version_id` and `overlay_version_id`
    /// is merged on top according to `policy`.
    pub async fn merge_projects(
        &mut self,
        base_version_id: &str,
        overlay_version_id: &str,
        name: Option<String>,
        policy: ConflictPolicy,
        actor: &Actor,
    ) -> CoreResult<Outcome<MergedProject>> {
        let (base_project, base_version) = self.find_version(base_version_id)?;
        let base_name = base_project.name.clone();
        let base_snapshot = base_version.snapshot_path.clone();

        let (overlay_project, overlay_version) = self.find_version(overlay_version_id)?;
        let overlay_name = overlay_project.name.clone();
        let overlay_snapshot = overlay_version.snapshot_path.clone();

        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{base_name} + {overlay_name}"));
        let message = format!(
            "Merged {base_name} at {base_version_id} with {overlay_name} at {overlay_version_id}"
        );
        let project_id = Identifier::project();

        let trees = self
            .build_project_trees(
                &project_id,
                &name,
                &base_snapshot,
                Some((&overlay_snapshot, policy)),
                message,
                actor,
            )
            .await?;

        let report = trees.report.clone().unwrap_or_default();
        let mut project = new_project(&project_id, &name, &trees, actor);
        project.origin = Some(ProjectOrigin::Merge {
            base_version_id: base_version_id.to_string(),
            overlay_version_id: overlay_version_id.to_string(),
        });

        let event = ActivityEvent::new(format!(
            "{} merged {} with {}",
            actor.name, base_name, overlay_name
        ))
        .with_detail(report.summary())
        .for_project(&project_id);

        let outcome = self.insert_project(project, event).await?;
        Ok(Outcome {
            value: MergedProject {
                project: outcome.value,
                report,
            },
            events: outcome.events,
        })
    }

    /// Seed a working copy, optionally merge an overlay into it, and
    /// capture the first version. Removes the project's trees on failure.
    async fn build_project_trees(
        &self,
        project_id: &str,
        name: &str,
        seed: &Path,
        overlay: Option<(&Path, ConflictPolicy)>,
        message: String,
        actor: &Actor,
    ) -> CoreResult<ProjectTrees> {
        let result = async {
            let working = self.store.seed_working_copy(seed, project_id, name).await?;
            let report = match overlay {
                Some((overlay, policy)) => Some(merge(&working, overlay, policy).await?),
                None => None,
            };
            let version = self
                .capture(project_id, name, &working, message, actor)
                .await?;
            Ok::<_, CoreError>(ProjectTrees {
                working,
                version,
                report,
            })
        }
        .await;

        if result.is_err() {
            self.abandon_project(project_id).await;
        }
        result
    }

    async fn insert_project(
        &mut self,
        project: Project,
        event: ActivityEvent,
    ) -> CoreResult<Outcome<Project>> {
        let mut next = self.catalog.clone();
        next.projects.insert(0, project.clone());

        match self.commit(next, vec![event]).await {
            Ok(events) => {
                info!(project = %project.id, name = %project.name, "Created project");
                Ok(Outcome {
                    value: project,
                    events,
                })
            }
            Err(e) => {
                self.abandon_project(&project.id).await;
                Err(e)
            }
        }
    }

    // ---- Workflows on an existing project ----

    /// Snapshot the working copy as a new version.
    pub async fn create_version(
        &mut self,
        project_id: &str,
        message: impl Into<String>,
        actor: &Actor,
    ) -> CoreResult<Outcome<ProjectVersion>> {
        let project = self.project(project_id)?;
        let name = project.name.clone();
        let working = project.working_copy_path.clone();

        let version = self
            .capture(project_id, &name, &working, message.into(), actor)
            .await?;

        let mut next = self.catalog.clone();
        let target = project_entry(&mut next, project_id)?;
        target.versions.insert(0, version.clone());
        target.updated_at = version.created_at;

        let event = ActivityEvent::new(format!("{} created a version of {}", actor.name, name))
            .with_detail(version.message.clone())
            .for_project(project_id);

        match self.commit(next, vec![event]).await {
            Ok(events) => Ok(Outcome {
                value: version,
                events,
            }),
            Err(e) => {
                self.store.discard(&version.snapshot_path).await;
                Err(e)
            }
        }
    }

    /// Replace the working copy with a version's snapshot.
    ///
    /// History is not touched; reverting twice to the same version leaves the
    /// same working copy.
    pub async fn revert_working_copy(
        &mut self,
        project_id: &str,
        version_id: &str,
        actor: &Actor,
    ) -> CoreResult<Outcome<()>> {
        let (project, version) = self.project_version(project_id, version_id)?;
        let name = project.name.clone();
        let working = project.working_copy_path.clone();
        let snapshot = version.snapshot_path.clone();
        let detail = version.message.clone();

        self.store.materialize(&working, &snapshot).await?;
        debug!(project = project_id, version = version_id, "Working copy replaced");

        let mut next = self.catalog.clone();
        project_entry(&mut next, project_id)?.updated_at = Utc::now();

        let event = ActivityEvent::new(format!(
            "{} reverted {} to {}",
            actor.name, name, version_id
        ))
        .with_detail(detail)
        .for_project(project_id);

        let events = self.commit(next, vec![event]).await?;
        Ok(Outcome { value: (), events })
    }

    /// Merge a version of this project into its working copy.
    ///
    /// The working copy wins every conflict. No version is created; the
    /// working copy is re-scanned to check it is still readable.
    pub async fn add_version_into_working_copy(
        &mut self,
        project_id: &str,
        version_id: &str,
        actor: &Actor,
    ) -> CoreResult<Outcome<WorkingCopyMerge>> {
        let (project, version) = self.project_version(project_id, version_id)?;
        let name = project.name.clone();
        let working = project.working_copy_path.clone();
        let snapshot = version.snapshot_path.clone();

        let report = merge(&working, &snapshot, ConflictPolicy::KEEP_WORKING_COPY).await?;
        let manifest = scan(&working).await?;

        let mut next = self.catalog.clone();
        project_entry(&mut next, project_id)?.updated_at = Utc::now();

        let event = ActivityEvent::new(format!(
            "{} added {} into the working copy of {}",
            actor.name, version_id, name
        ))
        .with_detail(report.summary())
        .for_project(project_id);

        let events = self.commit(next, vec![event]).await?;
        Ok(Outcome {
            value: WorkingCopyMerge { report, manifest },
            events,
        })
    }

    /// Flip the advisory lock. Returns whether the project is now locked.
    pub async fn toggle_lock(
        &mut self,
        project_id: &str,
        actor: &Actor,
    ) -> CoreResult<Outcome<bool>> {
        let mut next = self.catalog.clone();
        let project = project_entry(&mut next, project_id)?;

        project.is_locked = !project.is_locked;
        project.locked_by = project.is_locked.then(|| actor.name.clone());
        project.updated_at = Utc::now();

        let locked = project.is_locked;
        let verb = if locked { "locked" } else { "unlocked" };
        let event = ActivityEvent::new(format!("{} {} {}", actor.name, verb, project.name))
            .for_project(project_id);

        let events = self.commit(next, vec![event]).await?;
        Ok(Outcome {
            value: locked,
            events,
        })
    }

    /// Remove a version and its snapshot. The last version cannot be removed.
    pub async fn delete_version(
        &mut self,
        project_id: &str,
        version_id: &str,
        actor: &Actor,
    ) -> CoreResult<Outcome<ProjectVersion>> {
        let (project, _) = self.project_version(project_id, version_id)?;
        if project.versions.len() == 1 {
            return Err(CoreError::LastVersion {
                project: project.name.clone(),
            });
        }

        let mut next = self.catalog.clone();
        let target = project_entry(&mut next, project_id)?;
        let index = target
            .versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| CoreError::VersionNotFound(version_id.to_string()))?;
        let removed = target.versions.remove(index);
        target.updated_at = Utc::now();

        let event = ActivityEvent::new(format!(
            "{} deleted version {} of {}",
            actor.name, version_id, target.name
        ))
        .with_detail(removed.message.clone())
        .for_project(project_id);

        let events = self.commit(next, vec![event]).await?;

        if let Err(e) = self.store.remove_version(project_id, version_id).await {
            warn!(project = project_id, version = version_id, error = %e, "Failed to remove version snapshot");
        }

        Ok(Outcome {
            value: removed,
            events,
        })
    }

    /// Remove a project and all of its trees.
    pub async fn delete_project(
        &mut self,
        project_id: &str,
        actor: &Actor,
    ) -> CoreResult<Outcome<Project>> {
        self.project(project_id)?;

        let mut next = self.catalog.clone();
        let index = next
            .projects
            .iter()
            .position(|p| p.id == project_id)
            .ok_or_else(|| CoreError::ProjectNotFound(project_id.to_string()))?;
        let removed = next.projects.remove(index);

        let event = ActivityEvent::new(format!("{} deleted {}", actor.name, removed.name))
            .for_project(project_id);

        let events = self.commit(next, vec![event]).await?;
        self.abandon_project(project_id).await;

        Ok(Outcome {
            value: removed,
            events,
        })
    }

    // ---- Membership ----

    /// Add a member. Ids are unique per project, ignoring case.
    pub async fn add_member(
        &mut self,
        project_id: &str,
        user_id: &str,
        role: Role,
        actor: &Actor,
    ) -> CoreResult<Outcome<Member>> {
        let project = self.project(project_id)?;
        if project.member(user_id).is_some() || project.is_owner(user_id) {
            return Err(CoreError::DuplicateMember {
                project: project.name.clone(),
                user: user_id.to_string(),
            });
        }
        if role == Role::Owner {
            return Err(CoreError::OwnerExists {
                project: project.name.clone(),
            });
        }

        let member = Member {
            user_id: user_id.to_string(),
            role,
        };

        let mut next = self.catalog.clone();
        let target = project_entry(&mut next, project_id)?;
        target.members.push(member.clone());
        target.updated_at = Utc::now();

        let event = ActivityEvent::new(format!(
            "{} added {} to {}",
            actor.name, user_id, target.name
        ))
        .with_detail(format!("Role: {}", role.as_str()))
        .for_project(project_id);

        let events = self.commit(next, vec![event]).await?;
        Ok(Outcome {
            value: member,
            events,
        })
    }

    /// Remove a member. The owner cannot be removed.
    pub async fn remove_member(
        &mut self,
        project_id: &str,
        user_id: &str,
        actor: &Actor,
    ) -> CoreResult<Outcome<Member>> {
        let project = self.project(project_id)?;
        if project.is_owner(user_id) {
            return Err(CoreError::OwnerRemoval {
                project: project.name.clone(),
            });
        }

        let mut next = self.catalog.clone();
        let target = project_entry(&mut next, project_id)?;
        let needle = user_id.to_lowercase();
        let index = target
            .members
            .iter()
            .position(|m| m.user_id.to_lowercase() == needle)
            .ok_or_else(|| CoreError::MemberNotFound {
                project: target.name.clone(),
                user: user_id.to_string(),
            })?;
        let removed = target.members.remove(index);
        target.updated_at = Utc::now();

        let event = ActivityEvent::new(format!(
            "{} removed {} from {}",
            actor.name, removed.user_id, target.name
        ))
        .for_project(project_id);

        let events = self.commit(next, vec![event]).await?;
        Ok(Outcome {
            value: removed,
            events,
        })
    }

    // ---- Read-only views ----

    /// Materialize a fresh checkout of a version and return its path.
    pub async fn checkout(&self, project_id: &str, version_id: &str) -> CoreResult<PathBuf> {
        let (project, version) = self.project_version(project_id, version_id)?;
        Ok(self
            .store
            .checkout(&version.snapshot_path, project_id, version_id, &project.name)
            .await?)
    }

    /// Check out a version and hand it to the editor.
    pub async fn open_version(
        &self,
        project_id: &str,
        version_id: &str,
        editor: &dyn Editor,
    ) -> CoreResult<PathBuf> {
        let path = self.checkout(project_id, version_id).await?;
        editor.open(&path);
        Ok(path)
    }

    /// Hand the working copy to the editor.
    pub async fn open_working_copy(
        &self,
        project_id: &str,
        editor: &dyn Editor,
    ) -> CoreResult<PathBuf> {
        let path = self.project(project_id)?.working_copy_path.clone();
        if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(SnapshotError::NotDirectory(path).into());
        }
        editor.open(&path);
        Ok(path)
    }

    /// Delete every checkout of a project.
    pub async fn prune_checkouts(&self, project_id: &str) -> CoreResult<usize> {
        self.project(project_id)?;
        Ok(self.store.clear_checkouts(project_id).await?)
    }

    /// Scan the working copy and compare it with the newest version.
    pub async fn status(&self, project_id: &str) -> CoreResult<WorkingCopyStatus> {
        let project = self.project(project_id)?;
        let manifest = scan(&project.working_copy_path).await?;

        let (base_version_id, changes) = match project.latest_version() {
            Some(latest) => (Some(latest.id.clone()), latest.manifest.diff(&manifest)),
            None => (None, Manifest::default().diff(&manifest)),
        };

        Ok(WorkingCopyStatus {
            manifest,
            base_version_id,
            changes,
        })
    }

    /// File-level changes going from one version to another.
    pub fn diff_versions(
        &self,
        project_id: &str,
        from_version_id: &str,
        to_version_id: &str,
    ) -> CoreResult<ManifestDiff> {
        let (_, from) = self.project_version(project_id, from_version_id)?;
        let (_, to) = self.project_version(project_id, to_version_id)?;
        Ok(from.manifest.diff(&to.manifest))
    }

    /// Unified diff of one file between a version and the working copy.
    ///
    /// A file missing on one side diffs against empty content. A working
    /// file whose size and hash match the version's manifest diffs empty
    /// without being read. Files over [`MAX_DIFF_BYTES`] and non-UTF-8
    /// content are reported as a single "differ" line.
    pub async fn file_diff(
        &self,
        project_id: &str,
        version_id: &str,
        relative_path: &str,
    ) -> CoreResult<String> {
        let (project, version) = self.project_version(project_id, version_id)?;
        let relative = checked_relative(relative_path)?;
        let old_path = version.snapshot_path.join(&relative);
        let new_path = project.working_copy_path.join(&relative);

        let old_size = size_optional(&old_path).await?;
        let new_size = size_optional(&new_path).await?;
        if old_size.is_none() && new_size.is_none() {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{relative_path} is in neither {version_id} nor the working copy"),
            )));
        }

        if let (Some(entry), Some(size)) = (version.manifest.get(relative_path), new_size) {
            if entry.size == size && hash_blocking(&new_path).await? == entry.hash {
                return Ok(String::new());
            }
        }

        if old_size.max(new_size).unwrap_or(0) > MAX_DIFF_BYTES {
            return Ok(format!(
                "Files a/{relative_path} and b/{relative_path} differ (too large to diff)\n"
            ));
        }

        let old = read_optional(&old_path).await?.unwrap_or_default();
        let new = read_optional(&new_path).await?.unwrap_or_default();
        if old == new {
            return Ok(String::new());
        }

        match (std::str::from_utf8(&old), std::str::from_utf8(&new)) {
            (Ok(old), Ok(new)) => Ok(generate_diff(old, new, relative_path)),
            _ => Ok(format!(
                "Binary files a/{relative_path} and b/{relative_path} differ\n"
            )),
        }
    }

    // ---- Internals ----

    /// Scan a working copy and freeze it under a fresh version id.
    async fn capture(
        &self,
        project_id: &str,
        name: &str,
        working: &Path,
        message: String,
        actor: &Actor,
    ) -> CoreResult<ProjectVersion> {
        let manifest = scan(working).await?;
        let version_id = Identifier::version();

        let snapshot_path = match self
            .store
            .freeze(working, project_id, &version_id, name)
            .await
        {
            Ok(path) => path,
            Err(SnapshotError::SnapshotExists(path)) => {
                return Err(SnapshotError::SnapshotExists(path).into())
            }
            Err(e) => {
                self.store
                    .discard(&self.store.version_path(project_id, &version_id, name))
                    .await;
                return Err(e.into());
            }
        };

        debug!(
            project = project_id,
            version = %version_id,
            files = manifest.len(),
            bytes = manifest.total_size(),
            "Captured version"
        );

        Ok(ProjectVersion {
            id: version_id,
            created_at: Utc::now(),
            message,
            manifest,
            snapshot_path,
            creator_id: actor.id.clone(),
            creator_name: actor.name.clone(),
        })
    }

    /// Record events into `next`, persist it, then make it current.
    async fn commit(
        &mut self,
        mut next: Catalog,
        events: Vec<ActivityEvent>,
    ) -> CoreResult<Vec<ActivityEvent>> {
        for event in &events {
            next.record(event.clone());
        }
        self.persistence.save(&next).await?;
        self.catalog = next;
        for event in &events {
            info!(project = event.project_id.as_deref().unwrap_or("-"), "{}", event.title);
        }
        Ok(events)
    }

    async fn abandon_project(&self, project_id: &str) {
        if let Err(e) = self.store.remove_project(project_id).await {
            warn!(project = project_id, error = %e, "Failed to remove project trees");
        }
    }
}

fn project_entry<'a>(catalog: &'a mut Catalog, project_id: &str) -> CoreResult<&'a mut Project> {
    catalog
        .project_mut(project_id)
        .ok_or_else(|| CoreError::ProjectNotFound(project_id.to_string()))
}

fn new_project(id: &str, name: &str, trees: &ProjectTrees, actor: &Actor) -> Project {
    let now = trees.version.created_at;
    Project {
        id: id.to_string(),
        name: name.to_string(),
        source_path: None,
        source_access_token: None,
        origin: None,
        working_copy_path: trees.working.clone(),
        owner_id: actor.id.clone(),
        owner_name: actor.name.clone(),
        members: vec![Member {
            user_id: actor.id.clone(),
            role: Role::Owner,
        }],
        created_at: now,
        updated_at: now,
        is_locked: false,
        locked_by: None,
        versions: vec![trees.version.clone()],
    }
}

/// Reject paths that would escape a package root.
fn checked_relative(relative_path: &str) -> CoreResult<PathBuf> {
    let path = PathBuf::from(relative_path);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if relative_path.is_empty() || escapes {
        return Err(CoreError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a path inside the package: {relative_path}"),
        )));
    }
    Ok(path)
}

async fn size_optional(path: &Path) -> CoreResult<Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SnapshotError::io(path, e).into()),
    }
}

async fn hash_blocking(path: &Path) -> CoreResult<String> {
    let path = path.to_path_buf();
    let hash = tokio::task::spawn_blocking(move || hash_file(&path))
        .await
        .map_err(SnapshotError::from)??;
    Ok(hash)
}

async fn read_optional(path: &Path) -> CoreResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SnapshotError::io(path, e).into()),
    }
}

/// Generate a unified diff.
fn generate_diff(old: &str, new: &str, path: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut output = String::new();

    output.push_str(&format!("--- a/{path}\n"));
    output.push_str(&format!("+++ b/{path}\n"));

    for group in diff.grouped_ops(3) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;
        output.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_range.start + 1,
            old_range.len(),
            new_range.start + 1,
            new_range.len()
        ));

        for op in &group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };

                output.push_str(sign);
                output.push_str(change.value());
                if !change.value().ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}
