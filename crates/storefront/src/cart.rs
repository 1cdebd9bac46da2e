//! Cart store.
//!
//! The cart is a single insertion-ordered map from product id to quantity,
//! persisted to device storage after every mutation. A quantity of zero is
//! never stored: setting zero removes the entry.
//!
//! Ids of products that have since left the catalog stay in storage; they
//! are skipped when lines are resolved against a catalog, never pruned.

use acchiappasogni_core::ProductId;
use indexmap::IndexMap;
use serde_json::Value;

use crate::catalog::{Catalog, Product};
use crate::storage::{SharedStorage, StorageError, keys};

/// Largest quantity a single line can hold.
pub const MAX_QUANTITY: u32 = 9999;

/// In-memory cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: IndexMap<ProductId, u32>,
}

/// One cart entry joined with its product.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLine<'a> {
    pub product: &'a Product,
    pub quantity: u32,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp an arbitrary requested quantity to a storable one.
    ///
    /// `max(0, floor(qty))` capped at [`MAX_QUANTITY`], with NaN treated as
    /// zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamp_quantity(qty: f64) -> u32 {
        if qty.is_nan() || qty < 1.0 {
            return 0;
        }
        qty.floor().min(f64::from(MAX_QUANTITY)) as u32
    }

    /// Set a quantity; zero (after clamping) removes the entry.
    pub fn set(&mut self, id: ProductId, qty: f64) {
        match Self::clamp_quantity(qty) {
            0 => {
                self.lines.shift_remove(&id);
            }
            q => {
                self.lines.insert(id, q);
            }
        }
    }

    /// Quantity for an id, zero if absent.
    #[must_use]
    pub fn quantity(&self, id: &str) -> u32 {
        self.lines.get(id).copied().unwrap_or(0)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.lines.values().fold(0_u32, |acc, q| acc.saturating_add(*q))
    }

    /// Entries in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = (&ProductId, u32)> {
        self.lines.iter().map(|(id, q)| (id, *q))
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Entries whose product is in `catalog`, in insertion order.
    pub fn resolved_lines<'a>(
        &'a self,
        catalog: &'a Catalog,
    ) -> impl Iterator<Item = ResolvedLine<'a>> + 'a {
        self.lines.iter().filter_map(|(id, quantity)| {
            catalog.get(id.as_str()).map(|product| ResolvedLine {
                product,
                quantity: *quantity,
            })
        })
    }

    /// Parse a persisted cart, dropping anything that is not a positive
    /// quantity under a non-blank id.
    #[must_use]
    pub fn from_stored(text: &str) -> Self {
        let Ok(Value::Object(entries)) = serde_json::from_str::<Value>(crate::catalog::strip_bom(text))
        else {
            tracing::warn!("stored cart is not a JSON object, starting empty");
            return Self::new();
        };

        let mut cart = Self::new();
        for (id, qty) in entries {
            let (Ok(id), Some(qty)) = (ProductId::parse(&id), qty.as_f64()) else {
                continue;
            };
            cart.set(id, qty);
        }
        cart
    }

    fn to_stored(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.lines)
    }
}

/// Outcome of a cart mutation.
///
/// The in-memory cart is always updated; `storage_warning` is set when the
/// change could not be persisted.
#[derive(Debug)]
#[must_use]
pub struct CartUpdate {
    pub total_items: u32,
    pub storage_warning: Option<StorageError>,
}

/// Cart bound to device storage.
pub struct CartStore {
    cart: Cart,
    storage: SharedStorage,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").field("cart", &self.cart).finish_non_exhaustive()
    }
}

impl CartStore {
    /// Load the persisted cart, or start empty.
    #[must_use]
    pub fn load(storage: SharedStorage) -> Self {
        let cart = match storage.get(keys::CART) {
            Ok(Some(text)) => Cart::from_stored(&text),
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read stored cart, starting empty");
                Cart::new()
            }
        };
        Self { cart, storage }
    }

    /// Current contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Set a quantity (clamped; zero removes) and persist.
    pub fn set_quantity(&mut self, id: ProductId, qty: f64) -> CartUpdate {
        self.cart.set(id, qty);
        self.persist()
    }

    /// Add one.
    pub fn increment(&mut self, id: ProductId) -> CartUpdate {
        let next = f64::from(self.cart.quantity(id.as_str())) + 1.0;
        self.set_quantity(id, next)
    }

    /// Remove one; the entry goes away at zero.
    pub fn decrement(&mut self, id: ProductId) -> CartUpdate {
        let next = f64::from(self.cart.quantity(id.as_str())) - 1.0;
        self.set_quantity(id, next)
    }

    /// Put the product in the cart with quantity one unless already there.
    pub fn add(&mut self, id: ProductId) -> CartUpdate {
        if self.cart.quantity(id.as_str()) > 0 {
            return CartUpdate {
                total_items: self.total_item_count(),
                storage_warning: None,
            };
        }
        self.set_quantity(id, 1.0)
    }

    /// Drop the entry entirely.
    pub fn remove(&mut self, id: ProductId) -> CartUpdate {
        self.set_quantity(id, 0.0)
    }

    /// Empty the cart and persist.
    pub fn clear(&mut self) -> CartUpdate {
        self.cart = Cart::new();
        self.persist()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.cart.total_item_count()
    }

    fn persist(&self) -> CartUpdate {
        let result = self
            .cart
            .to_stored()
            .map_err(|source| StorageError::Serialization {
                key: keys::CART.to_string(),
                source,
            })
            .and_then(|text| self.storage.set(keys::CART, &text));

        let storage_warning = result.err();
        if let Some(e) = &storage_warning {
            tracing::warn!(error = %e, "cart change not persisted");
        }

        CartUpdate {
            total_items: self.total_item_count(),
            storage_warning,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{DeviceStorage, MemoryStorage};

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    /// Storage that refuses every write.
    struct FullStorage;

    impl DeviceStorage for FullStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::other("quota exceeded"),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(Cart::clamp_quantity(3.0), 3);
        assert_eq!(Cart::clamp_quantity(2.9), 2);
        assert_eq!(Cart::clamp_quantity(0.5), 0);
        assert_eq!(Cart::clamp_quantity(-4.0), 0);
        assert_eq!(Cart::clamp_quantity(f64::NAN), 0);
        assert_eq!(Cart::clamp_quantity(f64::INFINITY), MAX_QUANTITY);
        assert_eq!(Cart::clamp_quantity(1e12), MAX_QUANTITY);
    }

    #[test]
    fn test_set_zero_removes() {
        let mut store = CartStore::load(MemoryStorage::shared());
        let update = store.set_quantity(id("a"), 3.0);
        assert_eq!(update.total_items, 3);

        let update = store.set_quantity(id("a"), 0.0);
        assert_eq!(update.total_items, 0);
        assert_eq!(store.cart().quantity("a"), 0);
        assert!(store.cart().lines().all(|(pid, _)| pid.as_str() != "a"));
    }

    #[test]
    fn test_total_is_sum_of_quantities() {
        let mut store = CartStore::load(MemoryStorage::shared());
        let _ = store.set_quantity(id("a"), 2.0);
        let _ = store.set_quantity(id("b"), 1.7);
        let _ = store.set_quantity(id("c"), -3.0);
        let _ = store.increment(id("b"));

        let sum: u32 = store.cart().lines().map(|(_, q)| q).sum();
        assert_eq!(store.total_item_count(), sum);
        assert_eq!(sum, 4);
        assert!(store.cart().lines().all(|(_, q)| q >= 1));
    }

    #[test]
    fn test_total_stays_exact_with_huge_quantities() {
        let mut store = CartStore::load(MemoryStorage::shared());
        let _ = store.set_quantity(id("a"), f64::INFINITY);
        let _ = store.set_quantity(id("b"), 2.0);
        let update = store.increment(id("a"));

        assert_eq!(store.cart().quantity("a"), MAX_QUANTITY);
        let sum: u32 = store.cart().lines().map(|(_, q)| q).sum();
        assert_eq!(update.total_items, sum);
        assert_eq!(sum, MAX_QUANTITY + 2);
    }

    #[test]
    fn test_increment_decrement_add() {
        let mut store = CartStore::load(MemoryStorage::shared());
        let _ = store.add(id("a"));
        let _ = store.add(id("a"));
        assert_eq!(store.cart().quantity("a"), 1);

        let _ = store.increment(id("a"));
        assert_eq!(store.cart().quantity("a"), 2);

        let _ = store.decrement(id("a"));
        let update = store.decrement(id("a"));
        assert_eq!(update.total_items, 0);
        assert!(store.cart().is_empty());

        let _ = store.decrement(id("a"));
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_persists_and_reloads() {
        let storage = MemoryStorage::shared();
        let mut store = CartStore::load(Arc::clone(&storage));
        let _ = store.set_quantity(id("b"), 2.0);
        let _ = store.set_quantity(id("a"), 1.0);

        let reloaded = CartStore::load(Arc::clone(&storage));
        assert_eq!(reloaded.cart(), store.cart());
        let order: Vec<_> = reloaded.cart().lines().map(|(pid, _)| pid.to_string()).collect();
        assert_eq!(order, vec!["b", "a"]);

        let mut store = reloaded;
        let _ = store.clear();
        assert!(CartStore::load(storage).cart().is_empty());
    }

    #[test]
    fn test_from_stored_sanitizes() {
        let cart = Cart::from_stored(r#"{"a": 2, "b": 0, "c": -1, "d": 1.9, "e": "x", " ": 4}"#);
        assert_eq!(cart.quantity("a"), 2);
        assert_eq!(cart.quantity("d"), 1);
        assert_eq!(cart.len(), 2);

        assert!(Cart::from_stored("[1,2]").is_empty());
        assert!(Cart::from_stored("garbage").is_empty());
    }

    #[test]
    fn test_storage_failure_is_non_fatal() {
        let mut store = CartStore::load(Arc::new(FullStorage));
        let update = store.set_quantity(id("a"), 2.0);
        assert_eq!(update.total_items, 2);
        assert!(update.storage_warning.is_some());
        assert_eq!(store.cart().quantity("a"), 2);
    }

    #[test]
    fn test_resolved_lines_skip_dangling() {
        let catalog = Catalog::parse(r#"[{"id": "a", "priceCents": 100}]"#).unwrap();
        let mut cart = Cart::new();
        cart.set(id("gone"), 5.0);
        cart.set(id("a"), 2.0);

        let resolved: Vec<_> = cart.resolved_lines(&catalog).collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.first().unwrap().quantity, 2);
        // dangling entry is still stored
        assert_eq!(cart.quantity("gone"), 5);
    }
}
