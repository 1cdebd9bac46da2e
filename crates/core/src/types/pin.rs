//! Admin PIN storage types.
//!
//! Type-safe wrapper for the hashed admin PIN kept in device storage.

use serde::{Deserialize, Serialize};

/// PHC-format hash of the admin PIN (`$argon2id$...`).
///
/// The raw PIN is never stored; this wrapper keeps the hash from being
/// confused with any other string in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredPinHash(String);

impl StoredPinHash {
    /// Wrap an already computed PHC hash string.
    #[must_use]
    pub const fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Get the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for StoredPinHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for StoredPinHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}
