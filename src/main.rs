//! recipe - a terminal catalog of saved shell commands
//!
//! Thin binary entry point: loads settings, installs tracing and hands over
//! to the interface or to a non-interactive subcommand.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use recipe_config::{CatalogStore, ConfigManager, ConfigPaths, JsonCatalogStore};
use recipe_runner::{Platform, ProcessRunner};
use recipe_tui::{AppServices, AppState, StateOptions, TuiOptions, run_tui};

mod cli;
mod main_helpers;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let paths = ConfigPaths::resolve().context("Failed to locate the config directory")?;
    let manager = match &args.config {
        Some(path) => ConfigManager::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ConfigManager::load(&paths)?,
    };
    let mut config = manager.into_config();
    if args.background {
        config.execution.run_in_background = true;
    }

    if let Err(error) = main_helpers::initialize_tracing(&paths, &config.debug) {
        eprintln!("warning: tracing disabled: {error:#}");
    }

    let platform = Platform::detect();
    let store = JsonCatalogStore::new(paths.catalog_file()).with_seed_os(platform.os());
    let runner = ProcessRunner::new(config.execution.shell.as_deref(), paths.logs_dir());

    match &args.command {
        Some(Commands::Version) => {
            cli::handle_version_command();
        }
        Some(Commands::List) => {
            cli::handle_list_command(&store)?;
        }
        Some(Commands::Run { target }) => {
            let code = cli::handle_run_command(&store, &runner, target).await?;
            std::process::exit(code);
        }
        None => {
            let commands = store
                .load()
                .with_context(|| format!("Failed to load {}", store.path().display()))?;
            tracing::info!(entries = commands.len(), os = platform.os(), "starting interface");

            let state = AppState::new(commands, StateOptions::from_config(&config));
            let services = AppServices {
                store: Arc::new(store),
                runner: Arc::new(runner),
                platform,
            };
            run_tui(state, services, TuiOptions::from_config(&config.ui)).await?;
        }
    }

    Ok(())
}
