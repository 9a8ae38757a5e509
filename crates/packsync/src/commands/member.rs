//! Membership command handlers.

use super::context::Context;
use super::output::{print_events, print_json};
use clap::Subcommand;
use packsync_core::Role;

/// Member subcommands.
#[derive(Subcommand)]
pub enum MemberCommands {
    /// List a project's members
    List {
        /// Project id or name
        project: String,
    },
    /// Add a member to a project
    Add {
        /// Project id or name
        project: String,
        /// User id
        user: String,
        /// Role: editor or viewer
        #[arg(short, long, default_value = "editor")]
        role: String,
    },
    /// Remove a member from a project
    Remove {
        /// Project id or name
        project: String,
        /// User id
        user: String,
    },
}

/// Handle member commands.
pub async fn handle_member(ctx: &mut Context, command: MemberCommands) -> anyhow::Result<()> {
    match command {
        MemberCommands::List { project } => {
            let project_id = ctx.project_id(&project)?;
            let project = ctx.history.project(&project_id)?;
            if ctx.json {
                return print_json(&project.members);
            }
            for member in &project.members {
                println!("{:<24} {}", member.user_id, member.role.as_str());
            }
        }
        MemberCommands::Add {
            project,
            user,
            role,
        } => {
            let role = Role::parse(&role)
                .ok_or_else(|| anyhow::anyhow!("Unknown role '{role}' (use editor or viewer)"))?;
            let project_id = ctx.project_id(&project)?;
            let outcome = ctx
                .history
                .add_member(&project_id, &user, role, &ctx.actor)
                .await?;
            if ctx.json {
                return print_json(&outcome.value);
            }
            print_events(&outcome.events);
        }
        MemberCommands::Remove { project, user } => {
            let project_id = ctx.project_id(&project)?;
            let outcome = ctx
                .history
                .remove_member(&project_id, &user, &ctx.actor)
                .await?;
            if ctx.json {
                return print_json(&outcome.value);
            }
            print_events(&outcome.events);
        }
    }
    Ok(())
}
