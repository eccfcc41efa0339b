//! Shared building blocks for the recipe crates: the error taxonomy used by
//! the runner, the catalog store and the TUI, plus the path placeholder
//! expansion used when resolving per-command working directories.

pub mod ansi;
pub mod errors;
pub mod paths;
pub mod slug;

pub use ansi::{display_line, strip_ansi};
pub use errors::{ExecError, NO_EXIT_STATUS, PathError, StorageError};
pub use paths::{PathContext, normalize_path};
