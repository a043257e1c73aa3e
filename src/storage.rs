//storage.rs
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::models::Workout;

/// Fixed key the full workout list is persisted under.
pub const STORAGE_KEY: &str = "workouts";

/// String-keyed storage capability, injected into the app so persistence
/// can be swapped out in tests.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str);
}

/// Key-value store backed by a single JSON file on disk. The whole file
/// is read once on open and rewritten after every mutation.
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing or unreadable file starts
    /// the store empty instead of failing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    fn flush(&self) {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.path, raw) {
                    eprintln!("Failed to write {}: {}", self.path.display(), e);
                }
            }
            Err(e) => eprintln!("Failed to serialize storage: {}", e),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove_item(&mut self, key: &str) {
        self.entries.remove(key);
        self.flush();
    }
}

/// Volatile store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Serializes the full ordered workout list under [`STORAGE_KEY`].
pub fn save_workouts(storage: &mut dyn KeyValueStore, workouts: &[Workout]) {
    match serde_json::to_string(workouts) {
        Ok(raw) => storage.set_item(STORAGE_KEY, &raw),
        Err(e) => eprintln!("Failed to serialize workouts: {}", e),
    }
}

/// Reads the saved workout list back. A missing key or malformed content
/// yields an empty list rather than an error.
pub fn load_workouts(storage: &dyn KeyValueStore) -> Vec<Workout> {
    let Some(raw) = storage.get_item(STORAGE_KEY) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(workouts) => workouts,
        Err(e) => {
            eprintln!("Saved workouts are unreadable, starting empty: {}", e);
            Vec::new()
        }
    }
}
