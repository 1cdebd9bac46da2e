//! Named designs kept in device storage.

use acchiappasogni_core::DesignName;
use indexmap::IndexMap;

use super::{DesignError, DreamcatcherDesign};
use crate::storage::{SharedStorage, get_json, keys, set_json};

/// Every saved design, keyed by name in save order.
pub struct SavedDesigns {
    designs: IndexMap<String, DreamcatcherDesign>,
    storage: SharedStorage,
}

impl std::fmt::Debug for SavedDesigns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavedDesigns")
            .field("names", &self.designs.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SavedDesigns {
    /// Load saved designs; unreadable data counts as none saved.
    #[must_use]
    pub fn load(storage: SharedStorage) -> Self {
        let designs = match get_json::<IndexMap<String, DreamcatcherDesign>>(storage.as_ref(), keys::DESIGNS) {
            Ok(designs) => designs.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "saved designs unreadable, starting empty");
                IndexMap::new()
            }
        };
        Self { designs, storage }
    }

    /// Design names in save order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.designs.keys().map(String::as_str).collect()
    }

    /// Look up a design.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DreamcatcherDesign> {
        self.designs.get(name.trim())
    }

    /// Look up a design, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`].
    pub fn require(&self, name: &str) -> Result<&DreamcatcherDesign, DesignError> {
        self.get(name)
            .ok_or_else(|| DesignError::NotFound(name.to_string()))
    }

    /// Save or overwrite a design and persist.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range design, or a storage
    /// error if persisting fails.
    pub fn save(&mut self, name: &DesignName, design: DreamcatcherDesign) -> Result<(), DesignError> {
        design.validate()?;
        self.designs.insert(name.to_string(), design);
        self.persist()?;
        tracing::debug!(design = %name, "design saved");
        Ok(())
    }

    /// Delete a design and persist.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::NotFound`] or a storage error.
    pub fn delete(&mut self, name: &str) -> Result<DreamcatcherDesign, DesignError> {
        let removed = self
            .designs
            .shift_remove(name.trim())
            .ok_or_else(|| DesignError::NotFound(name.to_string()))?;
        self.persist()?;
        Ok(removed)
    }

    fn persist(&self) -> Result<(), DesignError> {
        set_json(self.storage.as_ref(), keys::DESIGNS, &self.designs)?;
        Ok(())
    }
}
