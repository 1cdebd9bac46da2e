//! PIN gate for the admin panel.
//!
//! The PIN is kept as an Argon2id PHC string under the PIN key. Until the
//! operator changes it, the documented default PIN unlocks the panel.
//! Unlocking sets a flag in device storage, so the panel stays unlocked on
//! this device until [`AdminGate::lock`] is called.

use acchiappasogni_core::StoredPinHash;
use acchiappasogni_storefront::storage::{SharedStorage, keys};
use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use secrecy::{ExposeSecret, SecretString};

use crate::error::AdminError;

/// PIN accepted until a custom one is set.
pub const DEFAULT_PIN: &str = "1234";

/// Shortest accepted PIN.
pub const MIN_PIN_LENGTH: usize = 4;

/// Longest accepted PIN.
pub const MAX_PIN_LENGTH: usize = 12;

const UNLOCKED: &str = "1";

/// Access control for the override editor.
pub struct AdminGate {
    storage: SharedStorage,
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("unlocked", &self.is_unlocked())
            .finish_non_exhaustive()
    }
}

impl AdminGate {
    /// Create a gate over device storage.
    #[must_use]
    pub const fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Storage this gate persists to.
    #[must_use]
    pub fn storage(&self) -> SharedStorage {
        SharedStorage::clone(&self.storage)
    }

    /// Whether the panel is unlocked on this device.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        match self.storage.get(keys::ADMIN_UNLOCKED) {
            Ok(flag) => flag.as_deref() == Some(UNLOCKED),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read admin flag, treating as locked");
                false
            }
        }
    }

    /// Whether a custom PIN replaced the default.
    #[must_use]
    pub fn has_custom_pin(&self) -> bool {
        matches!(self.stored_hash(), Ok(Some(_)))
    }

    /// Unlock with a PIN and remember it on this device.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::WrongPin` on mismatch, or a storage error.
    pub fn unlock(&self, pin: &SecretString) -> Result<(), AdminError> {
        self.verify(pin)?;
        self.storage.set(keys::ADMIN_UNLOCKED, UNLOCKED)?;
        tracing::info!("admin panel unlocked");
        Ok(())
    }

    /// Lock the panel.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the flag cannot be cleared.
    pub fn lock(&self) -> Result<(), AdminError> {
        self.storage.remove(keys::ADMIN_UNLOCKED)?;
        tracing::info!("admin panel locked");
        Ok(())
    }

    /// Replace the PIN.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::WrongPin` if `current` does not match,
    /// `AdminError::WeakPin` if `new` is not 4-12 digits, or a storage error.
    pub fn change_pin(&self, current: &SecretString, new: &SecretString) -> Result<(), AdminError> {
        self.verify(current)?;
        let new = new.expose_secret().trim();
        validate_pin(new)?;

        let hash = hash_pin(new)?;
        self.storage.set(keys::ADMIN_PIN, hash.as_str())?;
        tracing::info!("admin PIN changed");
        Ok(())
    }

    fn stored_hash(&self) -> Result<Option<StoredPinHash>, AdminError> {
        Ok(self
            .storage
            .get(keys::ADMIN_PIN)?
            .filter(|h| !h.trim().is_empty())
            .map(StoredPinHash::new))
    }

    fn verify(&self, pin: &SecretString) -> Result<(), AdminError> {
        let pin = pin.expose_secret().trim();
        let result = match self.stored_hash()? {
            Some(hash) => verify_pin(pin, &hash),
            None if pin == DEFAULT_PIN => Ok(()),
            None => Err(AdminError::WrongPin),
        };
        if result.is_err() {
            tracing::warn!("admin unlock rejected");
        }
        result
    }
}

/// Check the PIN format: 4-12 ASCII digits.
///
/// # Errors
///
/// Returns `AdminError::WeakPin` describing the problem.
pub fn validate_pin(pin: &str) -> Result<(), AdminError> {
    if !(MIN_PIN_LENGTH..=MAX_PIN_LENGTH).contains(&pin.len()) {
        return Err(AdminError::WeakPin(format!(
            "PIN must be {MIN_PIN_LENGTH} to {MAX_PIN_LENGTH} digits"
        )));
    }
    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AdminError::WeakPin("PIN must contain digits only".to_string()));
    }
    Ok(())
}

/// Hash a PIN using Argon2id.
fn hash_pin(pin: &str) -> Result<StoredPinHash, AdminError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| StoredPinHash::new(hash.to_string()))
        .map_err(|_| AdminError::PinHash)
}

/// Verify a PIN against a stored hash.
fn verify_pin(pin: &str, hash: &StoredPinHash) -> Result<(), AdminError> {
    let parsed_hash = PasswordHash::new(hash.as_str()).map_err(|_| AdminError::WrongPin)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(pin.as_bytes(), &parsed_hash)
        .map_err(|_| AdminError::WrongPin)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use acchiappasogni_storefront::storage::{DeviceStorage, MemoryStorage};

    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_default_pin_unlocks_and_persists() {
        let storage = MemoryStorage::shared();
        let gate = AdminGate::new(SharedStorage::clone(&storage));
        assert!(!gate.is_unlocked());

        assert!(matches!(gate.unlock(&secret("0000")), Err(AdminError::WrongPin)));
        assert!(!gate.is_unlocked());

        gate.unlock(&secret(" 1234 ")).unwrap();
        assert!(gate.is_unlocked());
        // a fresh gate on the same device stays unlocked
        assert!(AdminGate::new(SharedStorage::clone(&storage)).is_unlocked());

        gate.lock().unwrap();
        assert!(!AdminGate::new(storage).is_unlocked());
    }

    #[test]
    fn test_change_pin() {
        let storage = MemoryStorage::shared();
        let gate = AdminGate::new(SharedStorage::clone(&storage));

        assert!(matches!(
            gate.change_pin(&secret("9999"), &secret("5678")),
            Err(AdminError::WrongPin)
        ));
        gate.change_pin(&secret("1234"), &secret("5678")).unwrap();
        assert!(gate.has_custom_pin());

        let stored = storage.get(keys::ADMIN_PIN).unwrap().unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("5678"));

        assert!(matches!(gate.unlock(&secret("1234")), Err(AdminError::WrongPin)));
        gate.unlock(&secret("5678")).unwrap();
    }

    #[test]
    fn test_hash_pin_uses_fresh_salt() {
        let first = hash_pin("5678").unwrap();
        let second = hash_pin("5678").unwrap();
        assert_ne!(first.as_str(), second.as_str());

        verify_pin("5678", &first).unwrap();
        verify_pin("5678", &second).unwrap();
        assert!(matches!(verify_pin("8765", &first), Err(AdminError::WrongPin)));
    }

    #[test]
    fn test_pin_format() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123456789012").is_ok());
        assert!(matches!(validate_pin("123"), Err(AdminError::WeakPin(_))));
        assert!(matches!(validate_pin("12ab"), Err(AdminError::WeakPin(_))));
        assert!(validate_pin("1234567890123").is_err());
    }

    #[test]
    fn test_debug_hides_pin() {
        let gate = AdminGate::new(MemoryStorage::shared());
        let debug = format!("{gate:?}");
        assert!(debug.contains("unlocked"));
        assert!(!debug.contains(DEFAULT_PIN));
    }
}
