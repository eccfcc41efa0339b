use std::process::ExitStatus;
use std::time::Duration;

use chrono::{DateTime, Local};
use recipe_commons::{ExecError, NO_EXIT_STATUS};
use recipe_config::Command;

/// Outcome of one run of a catalog entry.
#[derive(Debug)]
pub struct ExecutionResult {
    pub command: Command,
    pub output: String,
    pub error: Option<ExecError>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// 0 on success, the child's status on a non-zero exit, -1 otherwise.
    pub exit_code: i32,
}

impl ExecutionResult {
    /// A run that ended before (or instead of) producing an exit status.
    pub fn failed(command: Command, started_at: DateTime<Local>, error: ExecError) -> Self {
        Self {
            command,
            output: String::new(),
            exit_code: error.exit_code(),
            error: Some(error),
            started_at,
            finished_at: Local::now(),
        }
    }

    pub fn from_status(
        command: Command,
        started_at: DateTime<Local>,
        output: String,
        status: ExitStatus,
    ) -> Self {
        let (exit_code, error) = exit_code_from_status(status);
        Self {
            command,
            output,
            error,
            started_at,
            finished_at: Local::now(),
            exit_code,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && self.error.is_none()
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Exit code and error for a finished child. Signal deaths have no status of
/// their own and map to -1.
pub fn exit_code_from_status(status: ExitStatus) -> (i32, Option<ExecError>) {
    if status.success() {
        return (0, None);
    }
    match status.code() {
        Some(code) => (code, Some(ExecError::ProcessExit { code })),
        None => (NO_EXIT_STATUS, Some(ExecError::Signaled)),
    }
}

/// Same mapping for children started on a pseudo-terminal.
pub fn exit_code_from_pty_status(status: &portable_pty::ExitStatus) -> (i32, Option<ExecError>) {
    if status.signal().is_some() {
        return (NO_EXIT_STATUS, Some(ExecError::Signaled));
    }
    match status.exit_code() as i32 {
        0 => (0, None),
        code => (code, Some(ExecError::ProcessExit { code })),
    }
}
