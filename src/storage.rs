//! Whole-table persistence for the three on-disk tables (`model`, `zones`,
//! `capacity`). The contract is availability over durability: a read that
//! can't find or parse a table starts that table empty rather than failing
//! the caller, and a write that fails is logged and otherwise swallowed.
//! The compatibility surface this preserves is the JSON shape of each
//! table, not its bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub trait Storage<T> {
    fn load(&self, table: &str) -> T;
    fn save(&self, table: &str, data: &T);
    fn clear(&self, table: &str);
}

/// Persists each table as `<dir>/<table>.json`.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(err) = std::fs::create_dir_all(&dir) {
            log::warn!("could not create data directory {}: {err}", dir.display());
        }
        Self { dir }
    }

    fn path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }
}

impl<T> Storage<T> for JsonFileStorage
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self, table: &str) -> T {
        let path = self.path(table);
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "corrupt {table} table at {}: {err}; starting from an empty table",
                    path.display()
                );
                T::default()
            }),
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!(
                        "could not read {table} table at {}: {err}; starting from an empty table",
                        path.display()
                    );
                }
                T::default()
            }
        }
    }

    fn save(&self, table: &str, data: &T) {
        let path = self.path(table);
        match serde_json::to_string_pretty(data) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&path, json) {
                    log::error!("failed to persist {table} table to {}: {err}", path.display());
                }
            }
            Err(err) => log::error!("failed to serialise {table} table: {err}"),
        }
    }

    fn clear(&self, table: &str) {
        let path = self.path(table);
        if let Err(err) = std::fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to clear {table} table at {}: {err}", path.display());
            }
        }
    }
}

/// Process-local storage backend for tests and for callers who don't want a
/// data directory at all.
pub struct InMemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> for InMemoryStorage
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self, table: &str) -> T {
        let blobs = self.blobs.lock().expect("storage mutex poisoned");
        match blobs.get(table) {
            Some(json) => serde_json::from_str(json).unwrap_or_default(),
            None => T::default(),
        }
    }

    fn save(&self, table: &str, data: &T) {
        let json = serde_json::to_string(data).expect("in-memory state is always serialisable");
        self.blobs
            .lock()
            .expect("storage mutex poisoned")
            .insert(table.to_string(), json);
    }

    fn clear(&self, table: &str) {
        self.blobs
            .lock()
            .expect("storage mutex poisoned")
            .remove(table);
    }
}
