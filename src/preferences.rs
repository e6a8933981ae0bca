// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable user preferences.
//!
//! Preferences live in a small string key-value store that other parts of
//! the application may share. The player only ever touches the
//! [`LIKED_EPISODES_KEY`] entry, which holds a JSON array of episode ids.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::PreferenceError;

/// Storage key holding the liked episode ids
pub const LIKED_EPISODES_KEY: &str = "likedPodcasts";

/// A string key-value store
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// Store `value` under `key`; the write is durable when this returns
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Key-value storage backed by a JSON object file
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(PreferenceError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| PreferenceError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_entries()?.remove(key))
    }

    /// Store `value` under `key`; a corrupt file is replaced by one holding
    /// only this entry
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e @ PreferenceError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "overwriting corrupt preferences file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&entries)?;

        let write_failed = |e| PreferenceError::WriteFailed {
            path: self.path.clone(),
            source: e,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        // Replace via rename so a crash mid-write never truncates the file
        let temp_path = self.path.with_extension("json.partial");
        std::fs::write(&temp_path, json).map_err(write_failed)?;
        std::fs::rename(&temp_path, &self.path).map_err(write_failed)
    }
}

/// In-memory key-value storage, for embedding without a data directory
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Durable storage for the liked episode set.
///
/// Implementations never fail: unreadable state loads as an empty set and
/// failed writes are logged and dropped.
pub trait PreferenceStore {
    fn load(&self) -> HashSet<String>;

    fn save(&mut self, liked: &HashSet<String>);
}

/// [`PreferenceStore`] over any [`KeyValueStorage`]
#[derive(Debug, Clone, Default)]
pub struct LikedEpisodes<S> {
    storage: S,
}

impl<S: KeyValueStorage> LikedEpisodes<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: KeyValueStorage> PreferenceStore for LikedEpisodes<S> {
    fn load(&self) -> HashSet<String> {
        let raw = match self.storage.get(LIKED_EPISODES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read liked episodes");
                return HashSet::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed liked episodes");
                HashSet::new()
            }
        }
    }

    fn save(&mut self, liked: &HashSet<String>) {
        // Sorted so the file is stable across saves
        let ids: BTreeSet<&String> = liked.iter().collect();
        let result = serde_json::to_string(&ids)
            .map_err(PreferenceError::from)
            .and_then(|json| self.storage.set(LIKED_EPISODES_KEY, &json));

        if let Err(e) = result {
            tracing::warn!(error = %e, "could not persist liked episodes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FailingStorage;

    impl KeyValueStorage for FailingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, PreferenceError> {
            Err(PreferenceError::ReadFailed {
                path: PathBuf::from("/nowhere"),
                source: std::io::Error::other("disk on fire"),
            })
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), PreferenceError> {
            Err(PreferenceError::WriteFailed {
                path: PathBuf::from("/nowhere"),
                source: std::io::Error::other("disk on fire"),
            })
        }
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn absent_file_loads_empty_set() {
        let dir = tempdir().unwrap();
        let store = LikedEpisodes::new(FileStorage::new(dir.path().join("prefs.json")));

        assert!(store.load().is_empty());
    }

    #[test]
    fn saved_set_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut store = LikedEpisodes::new(FileStorage::new(&path));
        store.save(&ids(&["b", "a"]));

        let reopened = LikedEpisodes::new(FileStorage::new(&path));
        assert_eq!(reopened.load(), ids(&["a", "b"]));
        assert!(!path.with_extension("json.partial").exists());
    }

    #[test]
    fn liked_key_holds_sorted_json_array() {
        let mut store = LikedEpisodes::new(MemoryStorage::default());
        store.save(&ids(&["zeta", "alpha"]));

        let raw = store.storage().get(LIKED_EPISODES_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"["alpha","zeta"]"#);
    }

    #[test]
    fn other_keys_in_shared_file_are_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut storage = FileStorage::new(&path);
        storage.set("theme", "dark").unwrap();

        let mut store = LikedEpisodes::new(storage);
        store.save(&ids(&["a"]));

        assert_eq!(
            FileStorage::new(&path).get("theme").unwrap(),
            Some("dark".to_string())
        );
    }

    #[test]
    fn empty_file_loads_empty_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "").unwrap();

        assert!(LikedEpisodes::new(FileStorage::new(&path)).load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            FileStorage::new(&path).get(LIKED_EPISODES_KEY),
            Err(PreferenceError::Corrupt { .. })
        ));
        assert!(LikedEpisodes::new(FileStorage::new(&path)).load().is_empty());
    }

    #[test]
    fn save_replaces_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = LikedEpisodes::new(FileStorage::new(&path));
        store.save(&ids(&["a"]));

        let reopened = LikedEpisodes::new(FileStorage::new(&path));
        assert_eq!(reopened.load(), ids(&["a"]));
    }

    #[test]
    fn malformed_value_loads_empty_set() {
        let mut storage = MemoryStorage::default();
        storage.set(LIKED_EPISODES_KEY, "42").unwrap();

        assert!(LikedEpisodes::new(storage).load().is_empty());
    }

    #[test]
    fn storage_failures_are_absorbed() {
        let mut store = LikedEpisodes::new(FailingStorage);

        assert!(store.load().is_empty());
        store.save(&ids(&["a"]));
    }
}
