//! Durable client-side key-value store.
//!
//! The session manager keeps two keys here: [`TOKEN_KEY`] (the raw token) and
//! [`USER_KEY`] (the cached user profile as JSON). [`FileStore`] survives
//! process restarts; [`MemoryStore`] does not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key holding the raw session token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the cached user profile, serialized as JSON.
pub const USER_KEY: &str = "user";

/// Error returned when the durable store cannot be read or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurableStoreError {
    /// The backing file could not be written.
    Io(String),
    /// A value could not be serialized.
    Encode(String),
    /// The store's lock was poisoned.
    LockPoisoned,
}

impl std::fmt::Display for DurableStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(reason) => write!(f, "durable store I/O error: {reason}"),
            Self::Encode(reason) => write!(f, "durable store encoding error: {reason}"),
            Self::LockPoisoned => write!(f, "durable store lock poisoned"),
        }
    }
}

impl std::error::Error for DurableStoreError {}

/// Persistent key-value storage on the client.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError>;
    fn remove(&self, key: &str) -> Result<(), DurableStoreError>;
}

impl<T: DurableStore + ?Sized> DurableStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), DurableStoreError> {
        (**self).remove(key)
    }
}

/// A durable store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError> {
        self.entries
            .lock()
            .map_err(|_| DurableStoreError::LockPoisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DurableStoreError> {
        self.entries
            .lock()
            .map_err(|_| DurableStoreError::LockPoisoned)?
            .remove(key);
        Ok(())
    }
}

/// A durable store persisted as a JSON object in a single file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
///
/// # Invariants
/// - `entries` mirrors the file contents after every successful write.
/// - A failed removal still drops the key from `entries`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts an empty store. An unreadable or corrupt file is
    /// logged and also starts empty; it is overwritten on the next write.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("discarding corrupt durable store {}: {e}", path.display());
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("cannot read durable store {}: {e}", path.display());
                HashMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), DurableStoreError> {
        let bytes =
            serde_json::to_vec(entries).map_err(|e| DurableStoreError::Encode(e.to_string()))?;
        let temp = self.path.with_extension("tmp");
        std::fs::write(&temp, bytes).map_err(|e| DurableStoreError::Io(e.to_string()))?;
        std::fs::rename(&temp, &self.path).map_err(|e| DurableStoreError::Io(e.to_string()))
    }

    /// Apply `change` to a copy of the entries, persist it, then publish it.
    /// Used for writes, which must not become visible unless persisted.
    fn update<F>(&self, change: F) -> Result<(), DurableStoreError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DurableStoreError::LockPoisoned)?;
        let mut next = entries.clone();
        change(&mut next);
        self.persist(&next)?;
        *entries = next;
        drop(entries);
        Ok(())
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DurableStoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    /// A removal always takes effect in memory, so a purge never leaves a
    /// stale token readable. A failed write is still reported.
    fn remove(&self, key: &str) -> Result<(), DurableStoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DurableStoreError::LockPoisoned)?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        let persisted = self.persist(&entries);
        drop(entries);
        persisted
    }
}
