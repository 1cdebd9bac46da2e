//! Application state for one storefront session.
//!
//! [`Storefront`] owns everything a page session would: shop config, the
//! catalog in use, the cart, the current filter selection and the delivery
//! method. Queries are answered by the pure functions in [`crate::search`],
//! [`crate::pricing`] and [`crate::order`]; this type only wires them
//! together.

use acchiappasogni_core::{DeliveryMethod, ProductId, SortMode};
use url::Url;

use crate::cart::{CartStore, CartUpdate};
use crate::catalog::{Catalog, CatalogLoader, CatalogOrigin, LoadError, LoadedCatalog, Product};
use crate::config::ShopConfig;
use crate::error::AppError;
use crate::order::{self, CustomerFields, OrderError, OrderMessage};
use crate::pricing::{Totals, compute_totals};
use crate::search::{CatalogQuery, filter_and_sort};
use crate::storage::SharedStorage;

/// Storefront session state.
pub struct Storefront {
    config: ShopConfig,
    catalog: Catalog,
    origin: CatalogOrigin,
    load_failure: Option<LoadError>,
    cart: CartStore,
    storage: SharedStorage,
    /// Current filter selection.
    pub query: CatalogQuery,
    /// Current sort order.
    pub sort: SortMode,
    /// Selected delivery method.
    pub delivery: DeliveryMethod,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("products", &self.catalog.len())
            .field("origin", &self.origin)
            .field("cart", self.cart.cart())
            .field("query", &self.query)
            .field("sort", &self.sort)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build state from an already loaded catalog.
    #[must_use]
    pub fn new(loaded: LoadedCatalog, storage: SharedStorage) -> Self {
        let cart = CartStore::load(SharedStorage::clone(&storage));
        Self {
            config: loaded.config,
            catalog: loaded.catalog,
            origin: loaded.origin,
            load_failure: loaded.failure,
            cart,
            storage,
            query: CatalogQuery::default(),
            sort: SortMode::default(),
            delivery: DeliveryMethod::default(),
        }
    }

    /// Load the catalog and restore the persisted cart.
    pub async fn open(loader: &CatalogLoader, storage: SharedStorage) -> Self {
        let loaded = loader.load(storage.as_ref()).await;
        Self::new(loaded, storage)
    }

    /// Shop settings.
    #[must_use]
    pub const fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// Catalog in use.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether the catalog came from the shared document or the override.
    #[must_use]
    pub const fn origin(&self) -> CatalogOrigin {
        self.origin
    }

    /// Why the products document could not be loaded, if it could not.
    #[must_use]
    pub const fn load_failure(&self) -> Option<&LoadError> {
        self.load_failure.as_ref()
    }

    /// Cart store.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Cart store, mutable.
    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    /// Storage handle shared with the cart.
    #[must_use]
    pub fn storage(&self) -> SharedStorage {
        SharedStorage::clone(&self.storage)
    }

    /// Swap in a different catalog, e.g. after an admin publish.
    pub fn replace_catalog(&mut self, catalog: Catalog, origin: CatalogOrigin) {
        self.catalog = catalog;
        self.origin = origin;
        self.load_failure = None;
    }

    /// Products matching the current query, in the current sort order.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        filter_and_sort(self.catalog.products(), &self.query, self.sort)
    }

    /// Totals for the current cart and delivery method.
    #[must_use]
    pub fn totals(&self) -> Totals {
        compute_totals(self.cart.cart(), &self.catalog, self.delivery, &self.config)
    }

    /// Put a catalog product in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the product is not in the catalog.
    pub fn add_to_cart(&mut self, id: &str) -> Result<CartUpdate, AppError> {
        let id = self.known_product(id)?;
        Ok(self.cart.add(id))
    }

    /// Set the quantity of a catalog product.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the product is not in the catalog.
    pub fn set_quantity(&mut self, id: &str, qty: f64) -> Result<CartUpdate, AppError> {
        let id = self.known_product(id)?;
        Ok(self.cart.set_quantity(id, qty))
    }

    /// Build the order message for the current cart.
    ///
    /// # Errors
    ///
    /// See [`order::build_order_message`].
    pub fn order_message(&self, customer: &CustomerFields) -> Result<OrderMessage, OrderError> {
        order::build_order_message(
            self.cart.cart(),
            &self.catalog,
            customer,
            self.delivery,
            &self.config,
        )
    }

    /// WhatsApp deep link carrying the order message.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotConfigured`] before anything else if the shop
    /// has no WhatsApp number, then any error from [`Self::order_message`].
    pub fn checkout_link(&self, customer: &CustomerFields) -> Result<Url, OrderError> {
        let phone = self
            .config
            .whatsapp_number
            .as_ref()
            .ok_or(OrderError::NotConfigured)?;
        let message = self.order_message(customer)?;
        tracing::info!(
            items = self.cart.total_item_count(),
            delivery = %self.delivery,
            "checkout link built"
        );
        Ok(order::whatsapp_link(phone, message.as_str())?)
    }

    /// WhatsApp deep link for a custom dreamcatcher request.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotConfigured`] if the shop has no WhatsApp number.
    pub fn custom_request_link(&self) -> Result<Url, OrderError> {
        order::custom_request_link(&self.config)
    }

    fn known_product(&self, id: &str) -> Result<ProductId, AppError> {
        self.catalog
            .get(id)
            .map(|p| p.id.clone())
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use acchiappasogni_core::{Money, PhoneNumber};

    use super::*;
    use crate::pricing::ShippingHint;
    use crate::search::CategoryFilter;
    use crate::storage::MemoryStorage;

    fn storefront(storage: SharedStorage) -> Storefront {
        let catalog = Catalog::parse(
            r#"[
                {"id": "A", "title": "Luna", "category": "Classici", "price": 10, "featured": true},
                {"id": "B", "title": "Piuma", "category": "Bambini", "price": 5}
            ]"#,
        )
        .unwrap();
        let config = ShopConfig {
            whatsapp_number: Some(PhoneNumber::parse("393401234567").unwrap()),
            shipping_fee: Money::from_cents(500).unwrap(),
            free_shipping_threshold: Some(Money::from_cents(3000).unwrap()),
            ..ShopConfig::default()
        };
        Storefront::new(
            LoadedCatalog {
                catalog,
                config,
                origin: CatalogOrigin::Remote,
                failure: None,
            },
            storage,
        )
    }

    #[test]
    fn test_worked_example_through_controller() {
        let mut shop = storefront(MemoryStorage::shared());
        let _ = shop.set_quantity("A", 2.0).unwrap();
        let update = shop.add_to_cart("B").unwrap();
        assert_eq!(update.total_items, 3);

        let totals = shop.totals();
        assert_eq!(totals.subtotal.cents(), 2500);
        assert_eq!(totals.total.cents(), 3000);
        assert_eq!(totals.hint, ShippingHint::SpendMore(Money::from_cents(500).unwrap()));

        shop.delivery = DeliveryMethod::Pickup;
        assert_eq!(shop.totals().total.cents(), 2500);
    }

    #[test]
    fn test_unknown_product_rejected() {
        let mut shop = storefront(MemoryStorage::shared());
        assert!(matches!(shop.add_to_cart("nope"), Err(AppError::NotFound(_))));
        assert_eq!(shop.cart().total_item_count(), 0);
    }

    #[test]
    fn test_visible_products_follow_query() {
        let mut shop = storefront(MemoryStorage::shared());
        assert_eq!(shop.visible_products().len(), 2);

        shop.query.category = CategoryFilter::parse("Bambini");
        let visible = shop.visible_products();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible.first().unwrap().id.as_str(), "B");
    }

    #[test]
    fn test_checkout_link() {
        let mut shop = storefront(MemoryStorage::shared());
        shop.delivery = DeliveryMethod::Pickup;
        assert!(matches!(
            shop.checkout_link(&CustomerFields::default()),
            Err(OrderError::EmptyCart)
        ));

        let _ = shop.add_to_cart("A").unwrap();
        let url = shop.checkout_link(&CustomerFields::default()).unwrap();
        assert_eq!(url.path(), "/393401234567");
        let (_, text) = url.query_pairs().next().unwrap();
        assert!(text.contains("- 1 × Luna — 10,00 €"));
    }

    #[test]
    fn test_checkout_without_number() {
        let mut shop = storefront(MemoryStorage::shared());
        let _ = shop.add_to_cart("A").unwrap();
        shop.config.whatsapp_number = None;
        assert!(matches!(
            shop.checkout_link(&CustomerFields::default()),
            Err(OrderError::NotConfigured)
        ));
    }

    #[test]
    fn test_cart_survives_reopen() {
        let storage = MemoryStorage::shared();
        let mut shop = storefront(SharedStorage::clone(&storage));
        let _ = shop.set_quantity("B", 4.0).unwrap();

        let reopened = storefront(storage);
        assert_eq!(reopened.cart().cart().quantity("B"), 4);
    }
}
