use std::fs;
use std::path::{Path, PathBuf};

use recipe_commons::StorageError;

const CONFIG_DIR_NAME: &str = ".recipe";
const CATALOG_FILE_NAME: &str = "commands.json";
const SETTINGS_FILE_NAME: &str = "recipe.toml";
const LOGS_DIR_NAME: &str = "logs";
const TRACE_FILE_NAME: &str = "recipe.log";

/// Overrides the config root (`~/.recipe` by default).
pub const RECIPE_HOME_ENV: &str = "RECIPE_HOME";

/// Filesystem layout under the config root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    root: PathBuf,
}

impl ConfigPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$RECIPE_HOME` when set and non-empty, otherwise `~/.recipe`.
    pub fn resolve() -> Result<Self, StorageError> {
        if let Ok(custom) = std::env::var(RECIPE_HOME_ENV) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                return Ok(Self::new(trimmed));
            }
        }

        dirs::home_dir()
            .map(|home| Self::new(home.join(CONFIG_DIR_NAME)))
            .ok_or(StorageError::ConfigRootUnavailable)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.root.join(CATALOG_FILE_NAME)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    /// Directory holding background run logs and the trace log.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR_NAME)
    }

    pub fn trace_file(&self) -> PathBuf {
        self.logs_dir().join(TRACE_FILE_NAME)
    }

    pub fn ensure_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .map_err(|source| StorageError::io("creating config directory", &self.root, source))
    }

    pub fn ensure_logs_dir(&self) -> Result<PathBuf, StorageError> {
        let logs = self.logs_dir();
        fs::create_dir_all(&logs)
            .map_err(|source| StorageError::io("creating log directory", &logs, source))?;
        Ok(logs)
    }
}
