//! Human-readable rendering of an [`ExecutionResult`].

use std::fmt::Write as _;
use std::time::Duration;

use chrono::SecondsFormat;

use crate::result::ExecutionResult;

const OUTPUT_DIVIDER: &str = "\n--- Output ---\n";
const ERROR_DIVIDER: &str = "\n--- Error ---\n";

/// Header, output section and (when present) error section.
pub fn format_report(result: &ExecutionResult) -> String {
    let mut report = format_summary(result);
    report.push_str(OUTPUT_DIVIDER);
    report.push_str(&result.output);
    if let Some(error) = &result.error {
        report.push_str(ERROR_DIVIDER);
        report.push_str(&error.to_string());
    }
    report
}

/// Header lines only: command text, start time, duration and exit code.
pub fn format_summary(result: &ExecutionResult) -> String {
    let mut summary = String::new();
    let _ = writeln!(summary, "Command: {}", result.command.command);
    let _ = writeln!(
        summary,
        "Started: {}",
        result.started_at.to_rfc3339_opts(SecondsFormat::Secs, false)
    );
    let _ = writeln!(summary, "Duration: {}", format_elapsed(result.duration()));
    let _ = writeln!(summary, "Exit Code: {}", result.exit_code);
    summary
}

/// Truncated to whole milliseconds.
fn format_elapsed(elapsed: Duration) -> String {
    let truncated = Duration::from_millis(elapsed.as_millis() as u64);
    if truncated.is_zero() {
        return "0ms".to_string();
    }
    humantime::format_duration(truncated).to_string()
}
