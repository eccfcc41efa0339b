use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use ratatui::crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};

/// Set while the interface owns the terminal; read by the panic hook and the
/// signal thread.
static TERMINAL_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Which terminal modes were switched on, so exactly those are undone.
#[derive(Debug, Clone, Default)]
pub(super) struct TerminalModeState {
    raw_mode_enabled: bool,
    alternate_screen_entered: bool,
    cursor_hidden: bool,
}

pub(super) fn enable_terminal_modes(
    stderr: &mut io::Stderr,
    alternate_screen: bool,
) -> Result<TerminalModeState> {
    let mut state = TerminalModeState::default();

    enable_raw_mode().context("failed to enable raw mode")?;
    state.raw_mode_enabled = true;
    TERMINAL_CLAIMED.store(true, Ordering::Release);

    if alternate_screen {
        match execute!(stderr, EnterAlternateScreen) {
            Ok(()) => state.alternate_screen_entered = true,
            Err(error) => {
                restore_terminal_modes(&state);
                return Err(error).context("failed to enter alternate screen");
            }
        }
    }

    match execute!(stderr, Hide) {
        Ok(()) => state.cursor_hidden = true,
        Err(error) => tracing::debug!(%error, "failed to hide cursor"),
    }

    Ok(state)
}

/// Undo `state` in reverse order, raw mode last. Failures are logged, not
/// returned, so every step is attempted.
pub(super) fn restore_terminal_modes(state: &TerminalModeState) {
    let mut stderr = io::stderr();
    let mut errors = Vec::new();

    if state.cursor_hidden
        && let Err(error) = execute!(stderr, Show)
    {
        errors.push(format!("cursor: {error}"));
    }

    if state.alternate_screen_entered
        && let Err(error) = execute!(stderr, LeaveAlternateScreen)
    {
        errors.push(format!("alternate screen: {error}"));
    }

    if state.raw_mode_enabled
        && let Err(error) = disable_raw_mode()
    {
        errors.push(format!("raw mode: {error}"));
    }

    TERMINAL_CLAIMED.store(false, Ordering::Release);
    if !errors.is_empty() {
        tracing::warn!(errors = ?errors, "some terminal modes failed to restore");
    }
}

pub(super) fn terminal_claimed() -> bool {
    TERMINAL_CLAIMED.load(Ordering::Acquire)
}

/// Best-effort reset used from the panic hook and the signal thread, where
/// the mode state is not reachable.
pub(super) fn force_restore() {
    if !TERMINAL_CLAIMED.swap(false, Ordering::AcqRel) {
        return;
    }
    let mut stderr = io::stderr();
    let _ = execute!(stderr, Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Chain a panic hook that gives the terminal back before the message prints.
pub(super) fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        force_restore();
        previous(info);
    }));
}

/// Terminal modes held for the lifetime of the interface. Released while a
/// child runs attached or the process is suspended, then reclaimed.
pub(super) struct TerminalGuard {
    modes: Option<TerminalModeState>,
    alternate_screen: bool,
}

impl TerminalGuard {
    pub(super) fn claim(alternate_screen: bool) -> Result<Self> {
        let modes = enable_terminal_modes(&mut io::stderr(), alternate_screen)?;
        Ok(Self {
            modes: Some(modes),
            alternate_screen,
        })
    }

    pub(super) fn release(&mut self) {
        if let Some(modes) = self.modes.take() {
            restore_terminal_modes(&modes);
        }
    }

    pub(super) fn reclaim(&mut self) -> Result<()> {
        if self.modes.is_none() {
            self.modes = Some(enable_terminal_modes(
                &mut io::stderr(),
                self.alternate_screen,
            )?);
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.release();
    }
}
