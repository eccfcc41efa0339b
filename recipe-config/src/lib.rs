//! Catalog model, catalog storage and settings for `recipe`.
//!
//! The catalog lives in `<config-root>/commands.json` and the settings in
//! `<config-root>/recipe.toml`, where the config root is `$RECIPE_HOME` or
//! `~/.recipe`.

pub mod catalog;
pub mod command;
pub mod debug;
pub mod paths;
pub mod seed;
pub mod settings;
pub mod store;

pub use catalog::ALL_CATEGORY;
pub use command::{Command, DEFAULT_CATEGORY};
pub use debug::{DebugConfig, TraceLevel};
pub use paths::{ConfigPaths, RECIPE_HOME_ENV};
pub use seed::default_catalog;
pub use settings::{
    ConfigError, ConfigManager, ExecutionConfig, RECIPE_CONFIG_PATH_ENV, RecipeConfig, UiConfig,
};
pub use store::{CatalogStore, JsonCatalogStore, MemoryCatalogStore};
