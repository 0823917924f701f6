//! Saved-record storage.
//!
//! Saved records live as one JSON list under a single key of an external
//! key-value store (browser local storage, a directory on disk, or memory in
//! tests). Every save appends an immutable snapshot with a fresh id and
//! timestamp; nothing already stored is ever rewritten in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::types::CostRecord;

/// Error types for record storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be read or written
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored list exists but cannot be parsed
    #[error("Stored records are corrupt: {0}")]
    Corrupt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Atomic get/put key-value collaborator.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory key-value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a key with raw stored text.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Raw stored text for a key.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Key-value store keeping one `<key>.json` file per key in a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader sees either the previous value or the new one.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

/// A persisted, immutable record snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub record: CostRecord,
}

/// Identifier and capture time handed back by [`RecordStore::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRef {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// Saved-record list on top of a key-value store.
pub struct RecordStore<S: KeyValueStore> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Create a store using the default key.
    pub fn new(backend: S) -> Self {
        Self::with_config(backend, &StoreConfig::default())
    }

    pub fn with_config(backend: S, config: &StoreConfig) -> Self {
        Self {
            backend,
            key: config.key.clone(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Save a snapshot of `record`, stamped now.
    pub fn save(&mut self, record: &CostRecord) -> Result<SavedRef, StoreError> {
        self.save_at(record, Utc::now())
    }

    /// Save a snapshot of `record` with an explicit capture time.
    ///
    /// Refuses to write when the stored list cannot be parsed, rather than
    /// replacing it.
    pub fn save_at(
        &mut self,
        record: &CostRecord,
        timestamp: DateTime<Utc>,
    ) -> Result<SavedRef, StoreError> {
        let mut saved = self.read_list()?;

        let mut id = uuid::Uuid::new_v4().to_string();
        while saved.iter().any(|s| s.id == id) {
            id = uuid::Uuid::new_v4().to_string();
        }

        saved.push(SavedRecord {
            id: id.clone(),
            timestamp,
            record: record.clone(),
        });
        self.write_list(&saved)?;

        tracing::info!(record_id = %id, total = saved.len(), "Saved record snapshot");
        Ok(SavedRef { id, timestamp })
    }

    /// All saved snapshots, oldest first.
    ///
    /// Unreadable or corrupt storage yields an empty list.
    pub fn load_all(&self) -> Vec<SavedRecord> {
        match self.read_list() {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Saved records unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Look up one snapshot.
    pub fn get(&self, id: &str) -> Option<SavedRecord> {
        self.load_all().into_iter().find(|s| s.id == id)
    }

    /// Delete a snapshot. Returns whether anything was removed.
    pub fn delete_by_id(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut saved = self.read_list()?;
        let before = saved.len();
        saved.retain(|s| s.id != id);
        if saved.len() == before {
            return Ok(false);
        }

        self.write_list(&saved)?;
        tracing::info!(record_id = %id, remaining = saved.len(), "Deleted record snapshot");
        Ok(true)
    }

    fn read_list(&self) -> Result<Vec<SavedRecord>, StoreError> {
        match self.backend.get(&self.key)? {
            None => Ok(Vec::new()),
            Some(text) if text.trim().is_empty() => Ok(Vec::new()),
            Some(text) => {
                serde_json::from_str(&text).map_err(|e| StoreError::Corrupt(e.to_string()))
            }
        }
    }

    fn write_list(&mut self, saved: &[SavedRecord]) -> Result<(), StoreError> {
        let text = serde_json::to_string(saved)?;
        self.backend.put(&self.key, text)
    }
}
