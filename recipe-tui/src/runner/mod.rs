//! Terminal runtime: owns the screen and the input stream, feeds events to
//! [`update`](crate::update::update) and carries out the effects it returns.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use ratatui::{Terminal, backend::CrosstermBackend};
use recipe_config::{CatalogStore, UiConfig};
use recipe_runner::{Platform, ProcessRunner};

use crate::state::AppState;
use crate::update::UpdateContext;

mod drive;
mod events;
mod signal;
mod terminal_modes;

use drive::Driver;
use events::{EventListener, EventLoop};
use signal::SignalCleanupGuard;
use terminal_modes::{TerminalGuard, install_panic_hook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuiOptions {
    pub alternate_screen: bool,
}

impl TuiOptions {
    pub fn from_config(ui: &UiConfig) -> Self {
        Self {
            alternate_screen: ui.alternate_screen,
        }
    }
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self::from_config(&UiConfig::default())
    }
}

/// Long-lived collaborators shared by the reducer and the effect executor.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn CatalogStore>,
    pub runner: Arc<ProcessRunner>,
    pub platform: Platform,
}

impl AppServices {
    pub fn context(&self) -> UpdateContext<'_> {
        UpdateContext {
            store: self.store.as_ref(),
            runner: self.runner.as_ref(),
            platform: &self.platform,
        }
    }
}

/// Run the interactive interface until the user quits.
///
/// The terminal is restored on every exit path, including panics and
/// SIGINT/SIGTERM.
pub async fn run_tui(state: AppState, services: AppServices, options: TuiOptions) -> Result<()> {
    install_panic_hook();
    let _signal_guard = SignalCleanupGuard::new()?;
    let mut guard = TerminalGuard::claim(options.alternate_screen)?;

    let backend = CrosstermBackend::new(io::stderr());
    let mut terminal = Terminal::new(backend).context("failed to initialize the terminal")?;
    let size = terminal
        .size()
        .context("failed to read the terminal size")?;
    let state = state.with_size(size.width, size.height);
    terminal
        .clear()
        .context("failed to clear the terminal")?;

    let (mut inputs, channels) = EventListener::new();
    let mut event_loop = EventLoop::start(channels);

    let driven = Driver {
        terminal: &mut terminal,
        guard: &mut guard,
        inputs: &mut inputs,
        event_loop: &mut event_loop,
        services: &services,
    }
    .drive(state)
    .await;

    event_loop.stop().await;
    if let Err(error) = terminal.show_cursor() {
        tracing::debug!(%error, "failed to show cursor");
    }
    guard.release();
    driven
}
