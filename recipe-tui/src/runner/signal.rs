use anyhow::{Context, Result};

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use super::terminal_modes::{force_restore, terminal_claimed};

/// Exit status used when the interface is torn down by a signal.
const SIGNAL_EXIT_CODE: i32 = 130;

/// Restores the terminal and exits when SIGINT or SIGTERM arrives while the
/// interface is running.
pub(super) struct SignalCleanupGuard {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SignalCleanupGuard {
    #[cfg(unix)]
    pub(super) fn new() -> Result<Self> {
        let mut signals =
            Signals::new([SIGINT, SIGTERM]).context("failed to register signal handlers")?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("recipe-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    // Ctrl+C typed into an attached child reaches us too.
                    if signal == SIGINT && !terminal_claimed() {
                        continue;
                    }
                    tracing::info!(signal, "terminating on signal");
                    force_restore();
                    std::process::exit(SIGNAL_EXIT_CODE);
                }
            })
            .context("failed to spawn the signal thread")?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    #[cfg(not(unix))]
    pub(super) fn new() -> Result<Self> {
        Ok(Self {})
    }
}

impl Drop for SignalCleanupGuard {
    #[cfg(unix)]
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {}
}
