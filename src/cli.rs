//! Command-line surface of the `recipe` binary.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use recipe_config::{CatalogStore, Command};
use recipe_runner::{ProcessRunner, format_report};

#[derive(Debug, Parser)]
#[command(
    name = "recipe",
    version,
    about = "Browse, edit and run a catalog of saved shell commands"
)]
pub struct Cli {
    /// Start with background mode on: runs go to a log file instead of the
    /// output view.
    #[arg(short = 'b', long = "background")]
    pub background: bool,

    /// Settings file to use instead of `<config-root>/recipe.toml`.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the catalog, one entry per line.
    List,
    /// Run one entry without the interface and print its report.
    Run {
        /// Entry id, or its name (case-insensitive).
        target: String,
    },
    /// Print the version.
    Version,
}

pub fn handle_version_command() {
    println!("recipe {}", env!("CARGO_PKG_VERSION"));
}

pub fn handle_list_command(store: &dyn CatalogStore) -> Result<()> {
    let commands = store.load().context("Failed to load the command catalog")?;
    if commands.is_empty() {
        println!("No commands found.");
        return Ok(());
    }

    for command in &commands {
        println!(
            "{}\t{}\t{}\t{}",
            command.id, command.category, command.name, command.command
        );
    }
    Ok(())
}

/// Run `target` with captured output and return its exit code.
pub async fn handle_run_command(
    store: &dyn CatalogStore,
    runner: &ProcessRunner,
    target: &str,
) -> Result<i32> {
    let commands = store.load().context("Failed to load the command catalog")?;
    let Some(command) = find_command(&commands, target) else {
        bail!("No command with id or name '{target}'");
    };

    tracing::info!(id = %command.id, name = %command.name, "running from the command line");
    let result = runner.run_captured(command).await;
    println!("{}", format_report(&result));
    Ok(result.exit_code)
}

/// Exact id match first, then a case-insensitive name match.
fn find_command<'a>(commands: &'a [Command], target: &str) -> Option<&'a Command> {
    let target = target.trim();
    commands.iter().find(|command| command.id == target).or_else(|| {
        commands
            .iter()
            .find(|command| command.name.eq_ignore_ascii_case(target))
    })
}
