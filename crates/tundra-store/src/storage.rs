//! # Key-Value Storage
//!
//! The persistence seam for the cart: a string key mapped to a JSON string,
//! the same contract browser local storage offers.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      KeyValueStore implementations                      │
//! │                                                                         │
//! │  MemoryStorage   HashMap<String, String>                               │
//! │                  Tests, embedding, sessions that never outlive the     │
//! │                  process                                               │
//! │                                                                         │
//! │  FileStorage     <data_dir>/<key>.json                                 │
//! │                  Written to <key>.json.tmp then renamed, so a crash    │
//! │                  mid-write leaves the previous cart intact             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;

/// Synchronous string key-value store.
///
/// Writes overwrite; there are no partial updates.
pub trait KeyValueStore: Send {
    /// Returns the stored value, or `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Memory Storage
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds one entry, e.g. a cart left over from a previous visit.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// File Storage
// =============================================================================

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Uses `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(dir.display().to_string(), e))?;
        debug!(dir = %dir.display(), "Opened file storage");
        Ok(FileStorage { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value).map_err(|e| StorageError::io(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(key, e))?;

        debug!(key = %key, bytes = value.len(), "Wrote storage entry");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
