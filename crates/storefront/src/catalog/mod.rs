//! Product catalog.
//!
//! A [`Catalog`] is one snapshot of the purchasable products, either the
//! network-sourced document or the admin override published to this device.
//! Ids are unique within a snapshot.

pub mod loader;
pub mod product;

use std::collections::{BTreeSet, HashSet};

use acchiappasogni_core::ProductId;
use serde_json::Value;
use thiserror::Error;

pub use loader::{CatalogLoader, CatalogOrigin, DataSource, LoadError, LoadedCatalog};
pub use product::{Product, ProductError, RawProduct};

/// Errors from parsing or mutating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid JSON.
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is valid JSON but not an array.
    #[error("catalog document must be a JSON array")]
    NotAnArray,

    /// A product with this id already exists.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),

    /// No product with this id.
    #[error("product not found: {0}")]
    NotFound(String),
}

/// Strip a UTF-8 byte-order mark and surrounding whitespace.
///
/// Documents saved by some editors carry a BOM, which `serde_json` rejects.
#[must_use]
pub fn strip_bom(text: &str) -> &str {
    text.trim_start_matches('\u{feff}').trim()
}

/// An ordered list of products with unique ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Build a catalog, keeping the first product for each id.
    #[must_use]
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut seen = HashSet::with_capacity(products.len());
        let products = products
            .into_iter()
            .filter(|p| {
                let fresh = seen.insert(p.id.clone());
                if !fresh {
                    tracing::warn!(id = %p.id, "dropping product with duplicate id");
                }
                fresh
            })
            .collect();
        Self { products }
    }

    /// Parse a products document (JSON array).
    ///
    /// Entries that fail normalization (no id, negative or garbled price,
    /// unreadable timestamp) are dropped with a warning; the rest of the
    /// catalog still loads.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the text is not JSON or not an array.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(strip_bom(text))?;
        let Value::Array(entries) = value else {
            return Err(CatalogError::NotAnArray);
        };

        let mut products = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Product>(entry) {
                Ok(product) => products.push(product),
                Err(e) => tracing::warn!(index, error = %e, "skipping invalid product entry"),
            }
        }

        Ok(Self::from_products(products))
    }

    /// Serialize as a pretty-printed JSON array in canonical form.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if an extra field cannot be serialized.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.products)
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id.as_str() == id)
    }

    /// Whether a product with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Iterate products in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct non-empty categories, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        self.products
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Insert a product at the front.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if the id is taken.
    pub fn insert_first(&mut self, product: Product) -> Result<(), CatalogError> {
        if self.contains(product.id.as_str()) {
            return Err(CatalogError::DuplicateId(product.id));
        }
        self.products.insert(0, product);
        Ok(())
    }

    /// Mutable access to one product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Product, CatalogError> {
        self.products
            .iter_mut()
            .find(|p| p.id.as_str() == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id.
    pub fn remove(&mut self, id: &str) -> Result<Product, CatalogError> {
        let index = self
            .products
            .iter()
            .position(|p| p.id.as_str() == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        Ok(self.products.remove(index))
    }

    /// Mutable iteration, for bulk edits.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Product> {
        self.products.iter_mut()
    }

    /// Consume the catalog.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}
