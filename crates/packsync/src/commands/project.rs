//! Project and version command handlers.

use super::context::Context;
use super::output::{format_size, format_time, print_diff, print_events, print_json, truncate};
use crate::editor::SystemEditor;
use packsync_core::{Editor, ImportOptions, NoopEditor};
use packsync_snapshot::ConflictPolicy;
use serde_json::json;
use std::path::PathBuf;

/// Import a package as a new project.
pub async fn handle_import(
    ctx: &mut Context,
    path: PathBuf,
    name: Option<String>,
    message: Option<String>,
    access_token: Option<String>,
) -> anyhow::Result<()> {
    let source = std::fs::canonicalize(&path).unwrap_or(path);
    let options = ImportOptions {
        name,
        access_token,
        message,
    };
    let outcome = ctx.history.import(&source, options, &ctx.actor).await?;

    if ctx.json {
        return print_json(&outcome.value);
    }
    print_events(&outcome.events);
    println!("Project: {}", outcome.value.id);
    println!("Working copy: {}", outcome.value.working_copy_path.display());
    Ok(())
}

/// List all projects.
pub fn handle_list(ctx: &Context) -> anyhow::Result<()> {
    let projects = ctx.history.projects();
    if ctx.json {
        return print_json(projects);
    }

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    println!(
        "{:<30} {:<28} {:<16} {:>8} {:<20}",
        "ID", "NAME", "OWNER", "VERSIONS", "UPDATED"
    );
    println!("{}", "-".repeat(106));
    for project in projects {
        let name = if project.is_locked {
            format!("{} [locked]", project.name)
        } else {
            project.name.clone()
        };
        println!(
            "{:<30} {:<28} {:<16} {:>8} {:<20}",
            project.id,
            truncate(&name, 28),
            truncate(&project.owner_name, 16),
            project.versions.len(),
            format_time(&project.updated_at)
        );
    }
    Ok(())
}

/// Show a project's details and version history.
pub fn handle_show(ctx: &Context, project: &str) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let project = ctx.history.project(&project_id)?;
    if ctx.json {
        return print_json(project);
    }

    println!("Project: {}", project.id);
    println!("Name: {}", project.name);
    println!("Owner: {} ({})", project.owner_name, project.owner_id);
    println!("Working copy: {}", project.working_copy_path.display());
    if let Some(source) = &project.source_path {
        println!("Imported from: {}", source.display());
    }
    println!("Created: {}", format_time(&project.created_at));
    println!("Updated: {}", format_time(&project.updated_at));
    if let Some(holder) = &project.locked_by {
        println!("Locked by: {holder}");
    }
    println!(
        "Members: {}",
        project
            .members
            .iter()
            .map(|m| format!("{} ({})", m.user_id, m.role.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    println!(
        "{:<30} {:<20} {:<16} {:>6} {:>10}  MESSAGE",
        "VERSION", "CREATED", "AUTHOR", "FILES", "SIZE"
    );
    println!("{}", "-".repeat(100));
    for version in &project.versions {
        println!(
            "{:<30} {:<20} {:<16} {:>6} {:>10}  {}",
            version.id,
            format_time(&version.created_at),
            truncate(&version.creator_name, 16),
            version.manifest.len(),
            format_size(version.manifest.total_size()),
            truncate(&version.message, 40)
        );
    }
    Ok(())
}

/// Snapshot the working copy as a new version.
pub async fn handle_commit(ctx: &mut Context, project: &str, message: String) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let outcome = ctx
        .history
        .create_version(&project_id, message, &ctx.actor)
        .await?;

    if ctx.json {
        return print_json(&outcome.value);
    }
    print_events(&outcome.events);
    println!(
        "Version: {} ({} files, {})",
        outcome.value.id,
        outcome.value.manifest.len(),
        format_size(outcome.value.manifest.total_size())
    );
    Ok(())
}

/// Replace the working copy with a version.
pub async fn handle_revert(ctx: &mut Context, project: &str, version: &str) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let version_id = ctx.version_id(&project_id, version)?;
    let outcome = ctx
        .history
        .revert_working_copy(&project_id, &version_id, &ctx.actor)
        .await?;

    if ctx.json {
        return print_json(&json!({ "projectId": project_id, "versionId": version_id }));
    }
    print_events(&outcome.events);
    Ok(())
}

/// Fork a version into a new project.
pub async fn handle_fork(
    ctx: &mut Context,
    version: &str,
    name: Option<String>,
) -> anyhow::Result<()> {
    let version_id = ctx.any_version_id(version)?;
    let outcome = ctx.history.fork(&version_id, name, &ctx.actor).await?;

    if ctx.json {
        return print_json(&outcome.value);
    }
    print_events(&outcome.events);
    println!("Project: {}", outcome.value.id);
    println!("Working copy: {}", outcome.value.working_copy_path.display());
    Ok(())
}

/// Merge two versions into a new project.
pub async fn handle_merge(
    ctx: &mut Context,
    base: &str,
    overlay: &str,
    name: Option<String>,
    policy: &str,
) -> anyhow::Result<()> {
    let policy = ConflictPolicy::parse(policy).ok_or_else(|| {
        anyhow::anyhow!("Unknown conflict policy '{policy}' (use keep-base or keep-overlay)")
    })?;
    let base_id = ctx.any_version_id(base)?;
    let overlay_id = ctx.any_version_id(overlay)?;

    let outcome = ctx
        .history
        .merge_projects(&base_id, &overlay_id, name, policy, &ctx.actor)
        .await?;

    if ctx.json {
        return print_json(&outcome.value);
    }
    print_events(&outcome.events);
    for conflict in &outcome.value.report.conflicts {
        println!("  conflict: {} -> {}", conflict.path, conflict.renamed_to);
    }
    println!("Project: {}", outcome.value.project.id);
    Ok(())
}

/// Fold a version into the working copy without creating a version.
pub async fn handle_add_version(
    ctx: &mut Context,
    project: &str,
    version: &str,
) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let version_id = ctx.version_id(&project_id, version)?;
    let outcome = ctx
        .history
        .add_version_into_working_copy(&project_id, &version_id, &ctx.actor)
        .await?;

    if ctx.json {
        return print_json(&outcome.value);
    }
    print_events(&outcome.events);
    for conflict in &outcome.value.report.conflicts {
        println!("  kept working copy, added {}", conflict.renamed_to);
    }
    Ok(())
}

/// Toggle the advisory lock.
pub async fn handle_lock(ctx: &mut Context, project: &str) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let outcome = ctx.history.toggle_lock(&project_id, &ctx.actor).await?;

    if ctx.json {
        return print_json(&json!({ "projectId": project_id, "locked": outcome.value }));
    }
    print_events(&outcome.events);
    Ok(())
}

/// Materialize a checkout, optionally opening it.
pub async fn handle_checkout(
    ctx: &Context,
    project: &str,
    version: &str,
    open: bool,
) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let version_id = ctx.version_id(&project_id, version)?;
    let editor: &dyn Editor = if open { &SystemEditor } else { &NoopEditor };
    let path = ctx
        .history
        .open_version(&project_id, &version_id, editor)
        .await?;

    if ctx.json {
        return print_json(&json!({ "path": path }));
    }
    println!("{}", path.display());
    Ok(())
}

/// Open the working copy, or a checkout of a version, in the editor.
pub async fn handle_open(ctx: &Context, project: &str, version: Option<&str>) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let path = match version {
        Some(version) => {
            let version_id = ctx.version_id(&project_id, version)?;
            ctx.history
                .open_version(&project_id, &version_id, &SystemEditor)
                .await?
        }
        None => {
            ctx.history
                .open_working_copy(&project_id, &SystemEditor)
                .await?
        }
    };
    println!("Opened {}", path.display());
    Ok(())
}

/// Compare the working copy with the newest version.
pub async fn handle_status(ctx: &Context, project: &str) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let status = ctx.history.status(&project_id).await?;

    if ctx.json {
        return print_json(&status);
    }
    match &status.base_version_id {
        Some(id) => println!("Compared with {id}"),
        None => println!("No versions yet"),
    }
    println!(
        "Working copy: {} files, {}",
        status.manifest.len(),
        format_size(status.manifest.total_size())
    );
    print_diff(&status.changes);
    Ok(())
}

/// Diff two versions, or one file between a version and the working copy.
pub async fn handle_diff(
    ctx: &Context,
    project: &str,
    from: &str,
    to: Option<&str>,
    file: Option<&str>,
) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let from_id = ctx.version_id(&project_id, from)?;

    if let Some(file) = file {
        let diff = ctx.history.file_diff(&project_id, &from_id, file).await?;
        if ctx.json {
            return print_json(&json!({ "path": file, "diff": diff }));
        }
        if diff.is_empty() {
            println!("No changes.");
        } else {
            print!("{diff}");
        }
        return Ok(());
    }

    let to = to.unwrap_or("latest");
    let to_id = ctx.version_id(&project_id, to)?;
    let diff = ctx.history.diff_versions(&project_id, &from_id, &to_id)?;

    if ctx.json {
        return print_json(&diff);
    }
    println!("{from_id} -> {to_id}");
    print_diff(&diff);
    Ok(())
}

/// Delete a project or one of its versions.
pub async fn handle_delete(
    ctx: &mut Context,
    project: &str,
    version: Option<&str>,
) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let events = match version {
        Some(version) => {
            let version_id = ctx.version_id(&project_id, version)?;
            ctx.history
                .delete_version(&project_id, &version_id, &ctx.actor)
                .await?
                .events
        }
        None => {
            ctx.history
                .delete_project(&project_id, &ctx.actor)
                .await?
                .events
        }
    };

    if ctx.json {
        return print_json(&events);
    }
    print_events(&events);
    Ok(())
}

/// Remove all checkouts of a project.
pub async fn handle_prune(ctx: &Context, project: &str) -> anyhow::Result<()> {
    let project_id = ctx.project_id(project)?;
    let removed = ctx.history.prune_checkouts(&project_id).await?;
    if ctx.json {
        return print_json(&json!({ "removed": removed }));
    }
    println!("Removed {removed} checkout(s)");
    Ok(())
}

/// Show the activity feed.
pub fn handle_activity(ctx: &Context, project: Option<&str>, limit: usize) -> anyhow::Result<()> {
    let project_id = project.map(|p| ctx.project_id(p)).transpose()?;
    let events: Vec<_> = ctx
        .history
        .activity()
        .iter()
        .filter(|e| project_id.is_none() || e.project_id == project_id)
        .take(limit)
        .collect();

    if ctx.json {
        return print_json(&events);
    }
    if events.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }
    for event in events {
        let detail = event
            .detail
            .as_deref()
            .map(|d| format!("  ({})", truncate(d, 60)))
            .unwrap_or_default();
        println!("{}  {}{}", format_time(&event.timestamp), event.title, detail);
    }
    Ok(())
}
