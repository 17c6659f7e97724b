//! Key-value persistence collaborator.
//!
//! The core persists two things: the user's display name and the chat
//! history. Both go through the [`KeyValueStore`] trait, a deliberately
//! small synchronous get/set/remove surface with a quota failure mode that
//! callers must treat as non-fatal.
//!
//! Two implementations are provided: [`MemoryStore`] for tests and
//! ephemeral sessions (with an optional byte cap to exercise the quota
//! path), and [`FileStore`], a single JSON object per store file.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Synchronous string key-value storage.
///
/// `set` may fail (quota exhaustion, I/O); per the error handling policy
/// callers catch and log rather than propagate.
pub trait KeyValueStore {
    /// Look up a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, overwriting any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }
}

/// In-memory store, optionally capped to simulate quota exhaustion.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: BTreeMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once total stored bytes would
    /// exceed `capacity`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: BTreeMap::new(),
            capacity: Some(capacity),
        }
    }

    fn stored_bytes(&self) -> usize {
        self.map.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(cap) = self.capacity {
            let replaced = self.map.get(key).map_or(0, |v| key.len() + v.len());
            let incoming = key.len() + value.len();
            if self.stored_bytes() - replaced + incoming > cap {
                return Err(Error::StorageFull(format!(
                    "write of {incoming} bytes exceeds capacity of {cap}"
                )));
            }
        }
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
    }
}

/// File-backed store: one JSON object per store file, written through on
/// every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a store at `path`, creating an empty one if the file does not
    /// exist yet.
    pub fn open(path: PathBuf) -> Result<Self> {
        let map = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                Error::Storage(format!("failed to read store at {}: {e}", path.display()))
            })?;
            serde_json::from_str(&raw).map_err(|e| {
                Error::Storage(format!("failed to parse store at {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, map })
    }

    /// Location of a named store file under the platform data directory.
    ///
    /// Identity and history live in separate files so their write-through
    /// persistence never clobbers each other.
    #[must_use]
    pub fn default_path(name: &str) -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "peerlink", "Peerlink")
            .map(|dirs| dirs.data_dir().join(name))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!(
                    "failed to create store directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let raw = serde_json::to_string(&self.map)
            .map_err(|e| Error::Storage(format!("failed to serialize store: {e}")))?;
        fs::write(&self.path, raw).map_err(|e| {
            Error::Storage(format!(
                "failed to write store at {}: {e}",
                self.path.display()
            ))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.map.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) {
        if self.map.remove(key).is_some() {
            if let Err(e) = self.persist() {
                tracing::warn!("failed to persist removal of '{key}': {e}");
            }
        }
    }
}
