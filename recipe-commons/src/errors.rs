use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code reported for runs that never produced a process exit status.
pub const NO_EXIT_STATUS: i32 = -1;

/// Failures while turning a working-directory policy into a concrete path.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("failed to resolve home directory")]
    HomeUnavailable,

    #[error("failed to resolve current working directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("working directory path is required when mode is 'absolute'")]
    MissingPath,

    #[error("working directory must be an absolute path: {}", .0.display())]
    NotAbsolute(PathBuf),

    #[error("working directory does not exist or is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("unknown working directory mode: {0}")]
    UnknownMode(String),
}

/// Everything that can go wrong between "run this catalog entry" and a
/// finished process.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("failed to start '{program}': {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("exit status {code}")]
    ProcessExit { code: i32 },

    #[error("process was terminated by a signal")]
    Signaled,

    #[error("I/O error while {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("pseudo-terminal failure: {0}")]
    Pty(String),
}

impl ExecError {
    pub fn io(action: &'static str, source: io::Error) -> Self {
        Self::Io { action, source }
    }

    /// Exit code reported for this failure. Only a real non-zero exit keeps
    /// the child's status; everything else maps to [`NO_EXIT_STATUS`].
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ProcessExit { code } => *code,
            _ => NO_EXIT_STATUS,
        }
    }

    /// True when the failure happened before any child process existed.
    pub fn is_pre_spawn(&self) -> bool {
        matches!(self, Self::EmptyCommand | Self::Path(_))
    }
}

/// Catalog load/save failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to locate the recipe config directory (no home directory)")]
    ConfigRootUnavailable,

    #[error("I/O error while {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse catalog '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("catalog store rejected the write: {0}")]
    Rejected(String),
}

impl StorageError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
