//! Catalog override editor.
//!
//! Edits happen on an in-memory copy of the catalog. Nothing reaches the
//! storefront until [`AdminEditor::publish`] writes the whole catalog under
//! the override key, where it shadows the shared products document until
//! [`AdminEditor::reset_override`] removes it.

use acchiappasogni_core::{Money, ProductId};
use acchiappasogni_storefront::catalog::{Catalog, Product};
use acchiappasogni_storefront::storage::{SharedStorage, keys};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use rand::Rng;

use crate::error::AdminError;
use crate::gate::AdminGate;

/// Largest photo accepted by [`AdminEditor::attach_image`]: 2.5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024 / 2;

/// Fields for a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub title: String,
    pub category: String,
    pub price: Money,
    pub image: String,
    pub description: Option<String>,
    pub featured: bool,
    pub tags: Vec<String>,
    pub in_stock: Option<bool>,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            title: "Acchiappasogni - Modello X".to_string(),
            category: "Acchiappasogni Classici".to_string(),
            price: Money::from_cents(500).unwrap_or(Money::ZERO),
            image: String::new(),
            description: None,
            featured: false,
            tags: Vec::new(),
            in_stock: None,
        }
    }
}

/// Changes to an existing product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub image: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub featured: Option<bool>,
    pub tags: Option<Vec<String>>,
    /// `Some(None)` clears the stock flag.
    pub in_stock: Option<Option<bool>>,
}

/// Unlocked editing session over a catalog copy.
pub struct AdminEditor {
    catalog: Catalog,
    storage: SharedStorage,
}

impl std::fmt::Debug for AdminEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminEditor")
            .field("products", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl AdminEditor {
    /// Start editing `catalog`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Locked` unless the gate is unlocked.
    pub fn open(gate: &AdminGate, catalog: Catalog) -> Result<Self, AdminError> {
        if !gate.is_unlocked() {
            return Err(AdminError::Locked);
        }
        Ok(Self {
            catalog,
            storage: gate.storage(),
        })
    }

    /// Catalog being edited.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Finish editing and keep the catalog.
    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Add a product at the top of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::MissingTitle` for a blank title.
    pub fn create(&mut self, draft: ProductDraft) -> Result<ProductId, AdminError> {
        let title = required_title(&draft.title)?;
        let id = self.fresh_id();

        let mut product = Product::new(id.clone(), title, draft.price);
        product.category = draft.category.trim().to_string();
        product.image = draft.image.trim().to_string();
        product.description = non_blank(draft.description);
        product.featured = draft.featured;
        product.created_at = Some(Utc::now());
        product.tags = draft.tags;
        product.in_stock = draft.in_stock;

        self.catalog.insert_first(product)?;
        tracing::info!(id = %id, "product created");
        Ok(id)
    }

    /// Apply a patch to one product.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::MissingTitle` if the patch blanks the title, or a
    /// catalog error if the id is unknown.
    pub fn update(&mut self, id: &str, patch: ProductPatch) -> Result<&Product, AdminError> {
        let title = patch.title.as_deref().map(required_title).transpose()?;
        let product = self.catalog.get_mut(id)?;

        if let Some(title) = title {
            product.title = title;
        }
        if let Some(category) = patch.category {
            product.category = category.trim().to_string();
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image) = patch.image {
            product.image = image.trim().to_string();
        }
        if let Some(description) = patch.description {
            product.description = non_blank(description);
        }
        if let Some(featured) = patch.featured {
            product.featured = featured;
        }
        if let Some(tags) = patch.tags {
            product.tags = tags;
        }
        if let Some(in_stock) = patch.in_stock {
            product.in_stock = in_stock;
        }

        tracing::info!(id, "product updated");
        Ok(product)
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns a catalog error if the id is unknown.
    pub fn delete(&mut self, id: &str) -> Result<Product, AdminError> {
        let removed = self.catalog.remove(id)?;
        tracing::info!(id, "product deleted");
        Ok(removed)
    }

    /// Set every product to the same price. Returns how many changed.
    pub fn set_all_prices(&mut self, price: Money) -> usize {
        let mut changed = 0;
        for product in self.catalog.iter_mut() {
            if product.price != price {
                product.price = price;
                changed += 1;
            }
        }
        tracing::info!(%price, changed, "bulk price update");
        changed
    }

    /// Store an uploaded photo inline as a `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::ImageTooLarge` above 2.5 MiB,
    /// `AdminError::UnsupportedImageType` unless `mime` is `image/*`, or a
    /// catalog error if the id is unknown.
    pub fn attach_image(&mut self, id: &str, bytes: &[u8], mime: &str) -> Result<(), AdminError> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AdminError::ImageTooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }
        let mime = mime.trim().to_ascii_lowercase();
        let is_image = mime
            .strip_prefix("image/")
            .is_some_and(|sub| !sub.is_empty() && !sub.contains(char::is_whitespace));
        if !is_image {
            return Err(AdminError::UnsupportedImageType(mime));
        }

        let product = self.catalog.get_mut(id)?;
        product.image = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
        tracing::info!(id, bytes = bytes.len(), "image attached");
        Ok(())
    }

    /// Write the catalog to device storage as the override.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn publish(&self) -> Result<(), AdminError> {
        let json = self.catalog.to_json_pretty()?;
        self.storage.set(keys::PRODUCTS_OVERRIDE, &json)?;
        tracing::info!(products = self.catalog.len(), "catalog override published");
        Ok(())
    }

    /// Remove the override so the shared document is used again.
    ///
    /// The in-memory catalog is left alone; reload to see the shared one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the key cannot be removed.
    pub fn reset_override(&self) -> Result<(), AdminError> {
        self.storage.remove(keys::PRODUCTS_OVERRIDE)?;
        tracing::info!("catalog override removed");
        Ok(())
    }

    /// Pretty JSON array suitable for `products.json`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Export` if serialization fails.
    pub fn export_json(&self) -> Result<String, AdminError> {
        Ok(self.catalog.to_json_pretty()?)
    }

    /// Replace the catalog with a products document. Returns the product count.
    ///
    /// # Errors
    ///
    /// Returns a catalog error if the text is not a JSON array.
    pub fn import_json(&mut self, text: &str) -> Result<usize, AdminError> {
        self.catalog = Catalog::parse(text)?;
        tracing::info!(products = self.catalog.len(), "catalog imported");
        Ok(self.catalog.len())
    }

    /// `AE-<epoch millis>-<0..999>`, retried on the unlikely collision.
    fn fresh_id(&self) -> ProductId {
        let mut rng = rand::rng();
        loop {
            let candidate = format!(
                "AE-{}-{}",
                Utc::now().timestamp_millis(),
                rng.random_range(0..1000)
            );
            if !self.catalog.contains(&candidate)
                && let Ok(id) = ProductId::parse(&candidate)
            {
                return id;
            }
        }
    }
}

fn required_title(title: &str) -> Result<String, AdminError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AdminError::MissingTitle);
    }
    Ok(title.to_string())
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use acchiappasogni_storefront::catalog::loader::read_override;
    use acchiappasogni_storefront::storage::MemoryStorage;
    use secrecy::SecretString;

    use super::*;

    fn unlocked_gate() -> AdminGate {
        let gate = AdminGate::new(MemoryStorage::shared());
        gate.unlock(&SecretString::from("1234".to_string())).unwrap();
        gate
    }

    fn catalog() -> Catalog {
        Catalog::parse(
            r#"[
                {"id": "AE-1", "title": "Luna", "category": "Classici", "price_from": 12,
                 "description": "Piume bianche", "madeBy": "Erika"},
                {"id": "AE-2", "title": "Sole", "category": "Bambini", "priceCents": 800}
            ]"#,
        )
        .unwrap()
    }

    fn money(cents: i64) -> Money {
        Money::from_cents(cents).unwrap()
    }

    #[test]
    fn test_locked_gate_refuses() {
        let gate = AdminGate::new(MemoryStorage::shared());
        assert!(matches!(
            AdminEditor::open(&gate, catalog()),
            Err(AdminError::Locked)
        ));
    }

    #[test]
    fn test_create_goes_first_with_generated_id() {
        let mut editor = AdminEditor::open(&unlocked_gate(), catalog()).unwrap();
        let id = editor
            .create(ProductDraft {
                title: "  Stella  ".to_string(),
                ..ProductDraft::default()
            })
            .unwrap();

        let first = editor.catalog().products().first().unwrap();
        assert_eq!(first.id, id);
        assert_eq!(first.title, "Stella");
        assert_eq!(first.price, money(500));
        assert!(first.created_at.is_some());

        let parts: Vec<&str> = id.as_str().splitn(3, '-').collect();
        assert_eq!(parts.first(), Some(&"AE"));
        assert!(parts.get(1).unwrap().parse::<i64>().is_ok());
        assert!(parts.get(2).unwrap().parse::<u32>().unwrap() < 1000);
    }

    #[test]
    fn test_title_required() {
        let mut editor = AdminEditor::open(&unlocked_gate(), catalog()).unwrap();
        let draft = ProductDraft {
            title: "   ".to_string(),
            ..ProductDraft::default()
        };
        assert!(matches!(editor.create(draft), Err(AdminError::MissingTitle)));

        let patch = ProductPatch {
            title: Some(String::new()),
            ..ProductPatch::default()
        };
        assert!(matches!(editor.update("AE-1", patch), Err(AdminError::MissingTitle)));
        assert_eq!(editor.catalog().get("AE-1").unwrap().title, "Luna");
    }

    #[test]
    fn test_update_and_delete() {
        let mut editor = AdminEditor::open(&unlocked_gate(), catalog()).unwrap();
        let updated = editor
            .update(
                "AE-2",
                ProductPatch {
                    price: Some(money(950)),
                    featured: Some(true),
                    description: Some(Some("Nuovo".to_string())),
                    ..ProductPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.price, money(950));
        assert!(updated.featured);
        assert_eq!(updated.title, "Sole");

        editor.delete("AE-1").unwrap();
        assert!(!editor.catalog().contains("AE-1"));
        assert!(matches!(editor.delete("AE-1"), Err(AdminError::Catalog(_))));
    }

    #[test]
    fn test_set_all_prices() {
        let mut editor = AdminEditor::open(&unlocked_gate(), catalog()).unwrap();
        assert_eq!(editor.set_all_prices(money(500)), 2);
        assert!(editor.catalog().iter().all(|p| p.price == money(500)));
        assert_eq!(editor.set_all_prices(money(500)), 0);
    }

    #[test]
    fn test_attach_image() {
        let mut editor = AdminEditor::open(&unlocked_gate(), catalog()).unwrap();
        editor.attach_image("AE-1", b"\x89PNG", "image/png").unwrap();
        assert_eq!(editor.catalog().get("AE-1").unwrap().image, "data:image/png;base64,iVBORw==");

        assert!(matches!(
            editor.attach_image("AE-1", b"%PDF", "application/pdf"),
            Err(AdminError::UnsupportedImageType(_))
        ));

        let big = vec![0_u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            editor.attach_image("AE-1", &big, "image/jpeg"),
            Err(AdminError::ImageTooLarge { .. })
        ));
        let exact = vec![0_u8; MAX_IMAGE_BYTES];
        editor.attach_image("AE-1", &exact, "image/jpeg").unwrap();
    }

    #[test]
    fn test_publish_and_reset() {
        let gate = unlocked_gate();
        let storage = gate.storage();
        let mut editor = AdminEditor::open(&gate, catalog()).unwrap();
        editor.delete("AE-2").unwrap();
        editor.publish().unwrap();

        let published = read_override(storage.as_ref()).unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published.get("AE-1").unwrap().extra.get("madeBy").unwrap(),
            "Erika"
        );

        editor.reset_override().unwrap();
        assert!(read_override(storage.as_ref()).is_none());
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut editor = AdminEditor::open(&unlocked_gate(), catalog()).unwrap();
        let _ = editor.create(ProductDraft::default()).unwrap();
        let before = editor.catalog().clone();

        let json = editor.export_json().unwrap();
        assert!(json.contains("\"priceCents\": 1200"));
        assert!(!json.contains("price_from"));

        assert_eq!(editor.import_json(&json).unwrap(), before.len());
        let key = |c: &Catalog| {
            c.iter()
                .map(|p| (p.id.clone(), p.title.clone(), p.price, p.category.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(editor.catalog()), key(&before));
    }

    #[test]
    fn test_import_rejects_non_array() {
        let mut editor = AdminEditor::open(&unlocked_gate(), catalog()).unwrap();
        assert!(matches!(
            editor.import_json(r#"{"id": "x"}"#),
            Err(AdminError::Catalog(_))
        ));
        assert_eq!(editor.catalog().len(), 2);
    }
}
