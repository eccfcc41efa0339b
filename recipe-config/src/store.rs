use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use recipe_commons::StorageError;
use tracing::{debug, info};

use crate::command::Command;
use crate::seed::default_catalog;

/// Durable home of the command catalog.
///
/// The TUI calls [`CatalogStore::save`] after every catalog mutation and after
/// every run that updates a last-run timestamp.
pub trait CatalogStore: Send + Sync {
    fn load(&self) -> Result<Vec<Command>, StorageError>;

    fn save(&self, commands: &[Command]) -> Result<(), StorageError>;
}

/// Pretty-printed JSON file, seeded with the starter catalog when missing.
#[derive(Debug, Clone)]
pub struct JsonCatalogStore {
    path: PathBuf,
    seed_os: String,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_os: std::env::consts::OS.to_string(),
        }
    }

    /// Seed with the starter catalog of another platform.
    pub fn with_seed_os(mut self, os: impl Into<String>) -> Self {
        self.seed_os = os.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| StorageError::io("creating catalog directory", parent, source))?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, data)
            .map_err(|source| StorageError::io("writing catalog", &staging, source))?;
        fs::rename(&staging, &self.path)
            .map_err(|source| StorageError::io("replacing catalog", &self.path, source))
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Result<Vec<Command>, StorageError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                let seeded = default_catalog(&self.seed_os);
                info!(
                    path = %self.path.display(),
                    entries = seeded.len(),
                    "catalog missing; writing starter catalog"
                );
                self.save(&seeded)?;
                return Ok(seeded);
            }
            Err(source) => return Err(StorageError::io("reading catalog", &self.path, source)),
        };

        let commands: Vec<Command> =
            serde_json::from_slice(&data).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), entries = commands.len(), "catalog loaded");
        Ok(commands)
    }

    fn save(&self, commands: &[Command]) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(commands).map_err(StorageError::Serialize)?;
        self.write_atomically(&data)?;
        debug!(path = %self.path.display(), entries = commands.len(), "catalog saved");
        Ok(())
    }
}

/// In-memory store for tests and dry runs. Saves can be made to fail to
/// exercise the "mutation kept, error shown" path.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    commands: Mutex<Vec<Command>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryCatalogStore {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands: Mutex::new(commands),
            ..Self::default()
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn load(&self) -> Result<Vec<Command>, StorageError> {
        Ok(self.snapshot())
    }

    fn save(&self, commands: &[Command]) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected("saves are disabled".into()));
        }
        *self.commands.lock() = commands.to_vec();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_catalog_is_seeded_and_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("commands.json");
        let store = JsonCatalogStore::new(&path).with_seed_os("linux");

        let loaded = store.load().unwrap();
        assert_eq!(loaded, default_catalog("linux"));
        assert!(path.exists());

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, loaded);
    }

    #[test]
    fn save_then_load_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCatalogStore::new(dir.path().join("commands.json"));
        let commands = vec![
            Command::new("a", "Build", "cargo build")
                .with_shell(true)
                .with_working_dir("absolute", "${cwd}/crate"),
        ];

        store.save(&commands).unwrap();
        assert_eq!(store.load().unwrap(), commands);
        assert!(!dir.path().join("commands.json.tmp").exists());
    }

    #[test]
    fn corrupt_catalog_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");
        fs::write(&path, "{ not json").unwrap();

        let error = JsonCatalogStore::new(&path).load().unwrap_err();
        assert!(matches!(error, StorageError::Parse { .. }));
    }

    #[test]
    fn memory_store_can_reject_saves() {
        let store = MemoryCatalogStore::new(vec![Command::new("1", "a", "true")]);
        store.set_fail_saves(true);
        assert!(store.save(&[]).is_err());
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.save_count(), 0);

        store.set_fail_saves(false);
        store.save(&[]).unwrap();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.save_count(), 1);
    }
}
