//! Process execution for recipe catalog entries.
//!
//! [`ProcessRunner`] implements the five ways an entry can run (captured,
//! streamed into a sink, detached into a log file, attached to the terminal,
//! or on a pseudo-terminal). [`ExecutionStrategy::select`] decides between
//! them and [`format_report`] renders the outcome.

pub mod format;
pub mod invocation;
pub mod pty;
pub mod result;
pub mod runner;
pub mod strategy;
pub mod workdir;

pub use format::{format_report, format_summary};
pub use invocation::{CommandLine, resolve_shell};
pub use portable_pty::PtySize;
pub use pty::PtySession;
pub use result::{ExecutionResult, exit_code_from_status};
pub use runner::{DetachedRun, ProcessRunner};
pub use strategy::{ExecutionStrategy, Platform, RECIPE_OS_OVERRIDE_ENV};
pub use workdir::{WorkingDirMode, WorkingDirResolver};
