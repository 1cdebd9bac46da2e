//! Device-local key/value storage.
//!
//! # Keys
//!
//! | Key | Contents |
//! |---|---|
//! | `ae_products_override_v1` | JSON array, full catalog published by the admin editor |
//! | `ae_cart_v1` | JSON object, product id -> quantity |
//! | `ae_admin_unlocked_v1` | `"1"` while the admin panel is unlocked on this device |
//! | `ae_admin_pin_v1` | Argon2 PHC hash of the admin PIN |
//! | `ae_designs_v1` | JSON object, design name -> saved dreamcatcher design |
//!
//! Storage is synchronous and last-write-wins. There is exactly one writer
//! (the current process), so there is no locking.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::instrument;

/// Well-known storage keys.
pub mod keys {
    /// Published catalog override.
    pub const PRODUCTS_OVERRIDE: &str = "ae_products_override_v1";
    /// Cart quantity map.
    pub const CART: &str = "ae_cart_v1";
    /// Admin unlocked flag.
    pub const ADMIN_UNLOCKED: &str = "ae_admin_unlocked_v1";
    /// Admin PIN hash.
    pub const ADMIN_PIN: &str = "ae_admin_pin_v1";
    /// Saved dreamcatcher designs.
    pub const DESIGNS: &str = "ae_designs_v1";
}

/// Errors from device storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed (quota, permissions, missing directory).
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    /// A value could not be serialized or deserialized.
    #[error("storage serialization error for key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters that cannot be used as a file name.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Synchronous string key/value store.
pub trait DeviceStorage: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn DeviceStorage>;

/// Read and deserialize a JSON value.
///
/// # Errors
///
/// Returns `StorageError` on read failure or malformed JSON.
pub fn get_json<T: serde::de::DeserializeOwned>(
    storage: &dyn DeviceStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(crate::catalog::strip_bom(&raw))
        .map(Some)
        .map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })
}

/// Serialize and write a JSON value.
///
/// # Errors
///
/// Returns `StorageError` on serialization or write failure.
pub fn set_json<T: serde::Serialize + ?Sized>(
    storage: &dyn DeviceStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &raw)
}

// =============================================================================
// File-backed storage
// =============================================================================

/// One file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DeviceStorage for FileStorage {
    #[instrument(skip(self), level = "debug")]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(bytes = value.len()))]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        // the temp file is removed on drop if anything below fails
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

// =============================================================================
// In-memory storage
// =============================================================================

/// Process-local storage, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store behind a shared handle.
    #[must_use]
    pub fn shared() -> SharedStorage {
        Arc::new(Self::new())
    }
}

impl DeviceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
