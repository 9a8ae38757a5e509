//! packsync - versioned snapshots of directory packages.
//!
//! This is the main entry point for the packsync CLI.

mod commands;
mod editor;

use clap::{Parser, Subcommand};
use commands::*;
use packsync_core::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "packsync")]
#[command(author, version, about = "Versioned snapshots of directory packages", long_about = None)]
struct Cli {
    /// Print output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the data directory for this run
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a package as a new project
    Import {
        /// Path to the package directory
        path: PathBuf,
        /// Project name (defaults to the package name)
        #[arg(short, long)]
        name: Option<String>,
        /// Message for the first version
        #[arg(short, long)]
        message: Option<String>,
        /// Opaque access token to store with the source path
        #[arg(long)]
        access_token: Option<String>,
    },
    /// List projects
    List,
    /// Show a project and its versions
    Show {
        /// Project id or name
        project: String,
    },
    /// Snapshot the working copy as a new version
    Commit {
        /// Project id or name
        project: String,
        /// Version message
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Replace the working copy with a version
    Revert {
        /// Project id or name
        project: String,
        /// Version id, prefix, or "latest"
        version: String,
    },
    /// Start a new project of your own from any version
    Fork {
        /// Version id or prefix
        version: String,
        /// Name of the new project
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Merge two versions into a new project
    Merge {
        /// Version the new working copy starts from
        base: String,
        /// Version merged on top
        overlay: String,
        /// Name of the new project
        #[arg(short, long)]
        name: Option<String>,
        /// Which side keeps conflicting paths: keep-base or keep-overlay
        #[arg(short, long, default_value = "keep-base")]
        policy: String,
    },
    /// Merge a version into the working copy; the working copy wins conflicts
    AddVersion {
        /// Project id or name
        project: String,
        /// Version id, prefix, or "latest"
        version: String,
    },
    /// Toggle the advisory lock on a project
    Lock {
        /// Project id or name
        project: String,
    },
    /// Materialize a disposable checkout of a version
    Checkout {
        /// Project id or name
        project: String,
        /// Version id, prefix, or "latest"
        #[arg(default_value = "latest")]
        version: String,
        /// Open the checkout in the default application
        #[arg(long)]
        open: bool,
    },
    /// Open the working copy (or a version checkout) in the default application
    Open {
        /// Project id or name
        project: String,
        /// Open a checkout of this version instead
        #[arg(long)]
        version: Option<String>,
    },
    /// Compare the working copy with the newest version
    Status {
        /// Project id or name
        project: String,
    },
    /// Compare two versions, or one file against the working copy
    Diff {
        /// Project id or name
        project: String,
        /// Older version
        from: String,
        /// Newer version (defaults to latest)
        to: Option<String>,
        /// Show a text diff of this file between FROM and the working copy
        #[arg(short, long, conflicts_with = "to")]
        file: Option<String>,
    },
    /// Delete a project, or one version with --version
    Delete {
        /// Project id or name
        project: String,
        /// Delete only this version
        #[arg(long)]
        version: Option<String>,
    },
    /// Remove all checkouts of a project
    Prune {
        /// Project id or name
        project: String,
    },
    /// Manage project members
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },
    /// Show recent activity
    Activity {
        /// Only show this project's activity
        #[arg(short, long)]
        project: Option<String>,
        /// Maximum number of events
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, _) = Config::load().await?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = Some(dir);
    }

    init_logging(cli.verbose, config.log_level);

    if let Commands::Config { command } = cli.command {
        return handle_config(command, cli.json).await;
    }

    let mut ctx = Context::open(&config, cli.json).await?;
    tracing::debug!(data_dir = %ctx.data_dir().display(), actor = %ctx.actor.id, "Ready");

    match cli.command {
        Commands::Import {
            path,
            name,
            message,
            access_token,
        } => handle_import(&mut ctx, path, name, message, access_token).await,
        Commands::List => handle_list(&ctx),
        Commands::Show { project } => handle_show(&ctx, &project),
        Commands::Commit { project, message } => handle_commit(&mut ctx, &project, message).await,
        Commands::Revert { project, version } => handle_revert(&mut ctx, &project, &version).await,
        Commands::Fork { version, name } => handle_fork(&mut ctx, &version, name).await,
        Commands::Merge {
            base,
            overlay,
            name,
            policy,
        } => handle_merge(&mut ctx, &base, &overlay, name, &policy).await,
        Commands::AddVersion { project, version } => {
            handle_add_version(&mut ctx, &project, &version).await
        }
        Commands::Lock { project } => handle_lock(&mut ctx, &project).await,
        Commands::Checkout {
            project,
            version,
            open,
        } => handle_checkout(&ctx, &project, &version, open).await,
        Commands::Open { project, version } => {
            handle_open(&ctx, &project, version.as_deref()).await
        }
        Commands::Status { project } => handle_status(&ctx, &project).await,
        Commands::Diff {
            project,
            from,
            to,
            file,
        } => handle_diff(&ctx, &project, &from, to.as_deref(), file.as_deref()).await,
        Commands::Delete { project, version } => {
            handle_delete(&mut ctx, &project, version.as_deref()).await
        }
        Commands::Prune { project } => handle_prune(&ctx, &project).await,
        Commands::Member { command } => handle_member(&mut ctx, command).await,
        Commands::Activity { project, limit } => handle_activity(&ctx, project.as_deref(), limit),
        Commands::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_merge_defaults() {
        let cli = Cli::try_parse_from(["packsync", "merge", "ver_a", "ver_b"]).unwrap();
        match cli.command {
            Commands::Merge { policy, name, .. } => {
                assert_eq!(policy, "keep-base");
                assert!(name.is_none());
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["packsync", "list", "--json", "--data-dir", "/tmp/x"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_diff_file_conflicts_with_to() {
        assert!(Cli::try_parse_from([
            "packsync", "diff", "Song", "ver_a", "ver_b", "--file", "ProjectData"
        ])
        .is_err());
    }
}
