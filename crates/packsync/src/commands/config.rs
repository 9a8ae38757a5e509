//! Configuration command handlers.

use super::output::print_json;
use clap::Subcommand;
use packsync_core::config::{Config, UserConfig};
use packsync_util::LogLevel;
use std::path::PathBuf;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration and where it came from
    Show,
    /// Update the global config file
    Set {
        /// Data directory for working copies, versions and the catalog
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Package extension, e.g. logicx
        #[arg(long)]
        extension: Option<String>,
        /// Your user id
        #[arg(long)]
        user_id: Option<String>,
        /// Your display name
        #[arg(long)]
        user_name: Option<String>,
        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
    },
}

/// Handle config commands.
pub async fn handle_config(command: ConfigCommands, json: bool) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => show_config(json).await,
        ConfigCommands::Set {
            data_dir,
            extension,
            user_id,
            user_name,
            log_level,
        } => {
            let log_level = match log_level {
                Some(raw) => Some(
                    LogLevel::parse(&raw)
                        .ok_or_else(|| anyhow::anyhow!("Unknown log level '{raw}'"))?,
                ),
                None => None,
            };
            let user = (user_id.is_some() || user_name.is_some()).then_some(UserConfig {
                id: user_id,
                name: user_name,
            });
            let changes = Config {
                data_dir,
                package_extension: extension,
                log_level,
                user,
            };

            let existing = match Config::global_config_dir() {
                Some(dir) if dir.join("config.json").exists() => {
                    Config::load_file(&dir.join("config.json")).await?
                }
                _ => Config::default(),
            };
            let path = existing.merge(changes).save(None).await?;
            println!("Saved configuration to {}", path.display());
            Ok(())
        }
    }
}

async fn show_config(json: bool) -> anyhow::Result<()> {
    let (config, sources) = Config::load().await?;

    if json {
        return print_json(&config);
    }

    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in &sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();

    let actor = config.actor();
    println!("Data directory: {}", config.resolved_data_dir()?.display());
    println!("Package extension: {}", config.package_kind().extension());
    println!("Acting as: {} ({})", actor.name, actor.id);

    Ok(())
}
