use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::debug::DebugConfig;
use crate::paths::ConfigPaths;

/// Points at a settings file outside the config root.
pub const RECIPE_CONFIG_PATH_ENV: &str = "RECIPE_CONFIG_PATH";

const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
const DEFAULT_CHROME_ROWS: u16 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// `[execution]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Shell used for `use_shell`/`interactive` entries. Falls back to
    /// `$SHELL`, then `bash`.
    pub shell: Option<String>,
    /// Delay between two reads of a running command's output.
    pub poll_interval_ms: u64,
    /// Start with background mode on.
    pub run_in_background: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            shell: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            run_in_background: false,
        }
    }
}

/// `[ui]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Rows taken by everything but the output pane in the execution view.
    pub chrome_rows: u16,
    pub alternate_screen: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            chrome_rows: DEFAULT_CHROME_ROWS,
            alternate_screen: true,
        }
    }
}

/// Contents of `recipe.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecipeConfig {
    pub execution: ExecutionConfig,
    pub ui: UiConfig,
    pub debug: DebugConfig,
}

impl RecipeConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loaded settings plus where they came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    config: RecipeConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// `$RECIPE_CONFIG_PATH` when set, otherwise `<config-root>/recipe.toml`.
    /// A missing default file yields the built-in defaults.
    pub fn load(paths: &ConfigPaths) -> Result<Self> {
        if let Ok(config_path) = std::env::var(RECIPE_CONFIG_PATH_ENV) {
            let trimmed = config_path.trim();
            if !trimmed.is_empty() {
                return Self::load_from_file(trimmed).with_context(|| {
                    format!("Failed to load settings from {RECIPE_CONFIG_PATH_ENV}={trimmed}")
                });
            }
        }

        let default_path = paths.settings_file();
        match Self::load_from_file(&default_path) {
            Ok(manager) => Ok(manager),
            Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %default_path.display(), "no settings file; using defaults");
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Load from an explicit file, which must exist.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = RecipeConfig::from_toml_str(&content, path)?;
        debug!(path = %path.display(), "settings loaded");

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    pub fn config(&self) -> &RecipeConfig {
        &self.config
    }

    pub fn into_config(self) -> RecipeConfig {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::TraceLevel;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = RecipeConfig::from_toml_str(
            "[execution]\nshell = \"/bin/zsh\"\n\n[debug]\nenable_tracing = true\ntrace_level = \"debug\"\n",
            Path::new("recipe.toml"),
        )
        .unwrap();

        assert_eq!(config.execution.shell.as_deref(), Some("/bin/zsh"));
        assert_eq!(config.execution.poll_interval_ms, 200);
        assert!(!config.execution.run_in_background);
        assert_eq!(config.ui, UiConfig::default());
        assert_eq!(config.debug.trace_level, TraceLevel::Debug);
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let error = RecipeConfig::from_toml_str("[ui\nchrome_rows = 3", Path::new("/x/recipe.toml"))
            .unwrap_err();
        assert!(error.to_string().contains("/x/recipe.toml"));
    }

    #[test]
    #[serial]
    fn missing_default_file_yields_defaults() {
        let dir = assert_fs::TempDir::new().unwrap();
        // SAFETY: serialized with the other environment-mutating tests.
        unsafe { std::env::remove_var(RECIPE_CONFIG_PATH_ENV) };

        let manager = ConfigManager::load(&ConfigPaths::new(dir.path())).unwrap();
        assert_eq!(manager.config(), &RecipeConfig::default());
        assert!(manager.config_path().is_none());
    }

    #[test]
    #[serial]
    fn env_override_takes_precedence() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("recipe.toml")
            .write_str("[ui]\nchrome_rows = 4\n")
            .unwrap();
        let custom = dir.child("custom.toml");
        custom.write_str("[ui]\nchrome_rows = 6\n").unwrap();

        unsafe { std::env::set_var(RECIPE_CONFIG_PATH_ENV, custom.path()) };
        let loaded = ConfigManager::load(&ConfigPaths::new(dir.path()));
        unsafe { std::env::remove_var(RECIPE_CONFIG_PATH_ENV) };

        let manager = loaded.unwrap();
        assert_eq!(manager.config().ui.chrome_rows, 6);
        assert_eq!(manager.config_path(), Some(custom.path()));
    }

    #[test]
    #[serial]
    fn missing_override_file_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");

        unsafe { std::env::set_var(RECIPE_CONFIG_PATH_ENV, &missing) };
        let loaded = ConfigManager::load(&ConfigPaths::new(dir.path()));
        unsafe { std::env::remove_var(RECIPE_CONFIG_PATH_ENV) };

        let message = format!("{:#}", loaded.unwrap_err());
        assert!(message.contains(RECIPE_CONFIG_PATH_ENV));
    }
}
