use std::path::PathBuf;
use std::time::Duration;

use recipe_config::Command;
use recipe_runner::DetachedRun;

/// Side effects requested by a transition and carried out by the driver.
#[derive(Debug)]
pub enum Effect {
    /// Deliver `PollTick { run_id }` after `after`.
    ScheduleTick { run_id: u64, after: Duration },
    /// Run with streaming capture, appending to `sink`.
    StartStreaming {
        run_id: u64,
        command: Command,
        sink: PathBuf,
    },
    /// Run on a pseudo-terminal, appending its output to `sink`.
    StartPty {
        run_id: u64,
        command: Command,
        sink: PathBuf,
    },
    /// Start a run whose log file already exists.
    SpawnDetached(DetachedRun),
    /// Release the terminal, run `command` attached to it, then restore.
    RunAttached { command: Command },
    Quit,
}
