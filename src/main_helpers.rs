use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::{Context, Result};
use recipe_config::{ConfigPaths, DebugConfig};
use tracing_subscriber::{EnvFilter, prelude::*};

/// Install the trace subscriber. `RUST_LOG` takes precedence over the
/// `[debug]` section; with neither, nothing is recorded. Traces always go to
/// `<config-root>/logs/recipe.log` because the interface owns the terminal.
pub(crate) fn initialize_tracing(paths: &ConfigPaths, debug: &DebugConfig) -> Result<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match debug.filter_directive() {
            Some(directive) => EnvFilter::new(directive),
            None => return Ok(false),
        },
    };

    paths
        .ensure_logs_dir()
        .context("Failed to create the log directory")?;
    let log_file = paths.trace_file();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to open trace log {}", log_file.display()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    match init_result {
        Ok(()) => {
            tracing::info!(log_file = %log_file.display(), "tracing enabled");
            Ok(true)
        }
        Err(err) => {
            tracing::warn!(error = %err, "tracing already initialized; skipping setup");
            Ok(false)
        }
    }
}
