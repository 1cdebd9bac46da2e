//! Integration tests for Acchiappasogni.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p acchiappasogni-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `loader_http` - Catalog loading from a static host (mocked with wiremock)
//! - `device_storage` - File-backed device storage
//! - `checkout` - Browse, cart, totals and WhatsApp link end to end
//! - `admin_override` - Admin edits published as the device override
//!
//! The helpers below build shop documents and throwaway device storage.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use acchiappasogni_storefront::catalog::loader::{CONFIG_DOCUMENT, PRODUCTS_DOCUMENT};
use acchiappasogni_storefront::catalog::{CatalogLoader, DataSource};
use acchiappasogni_storefront::storage::{FileStorage, SharedStorage};
use tempfile::TempDir;

/// Three products: two classics, one for children.
pub const PRODUCTS_JSON: &str = r#"[
    {
        "id": "AE-1",
        "title": "Luna d'Argento",
        "category": "Acchiappasogni Classici",
        "priceCents": 1000,
        "featured": true,
        "createdAt": "2024-03-01T10:00:00Z",
        "tags": ["luna", "argento"]
    },
    {
        "id": "AE-2",
        "title": "Piuma Blu",
        "category": "Acchiappasogni Bambini",
        "price": 5,
        "createdAt": "2024-05-01T10:00:00Z",
        "tags": ["blu"]
    },
    {
        "id": "AE-3",
        "title": "Éclisse",
        "category": "Acchiappasogni Classici",
        "price_from": "22.50",
        "inStock": false
    }
]"#;

/// Config with a WhatsApp number, a 5 € fee and free shipping from 30 €.
pub const CONFIG_JSON: &str = r#"{
    "brandName": "Acchiappasogni di Prova",
    "whatsappNumber": "+39 340 123 4567",
    "shippingFee": 5,
    "freeShippingThreshold": 30
}"#;

/// A data directory holding both shop documents.
///
/// # Panics
///
/// Panics if the temporary directory cannot be written.
#[must_use]
#[allow(clippy::expect_used)]
pub fn data_dir(products: &str, config: &str) -> TempDir {
    let dir = TempDir::new().expect("create data dir");
    write(dir.path(), PRODUCTS_DOCUMENT, products);
    write(dir.path(), CONFIG_DOCUMENT, config);
    dir
}

/// Loader reading from a local data directory.
#[must_use]
pub fn directory_loader(dir: &TempDir) -> CatalogLoader {
    CatalogLoader::new(DataSource::Directory(dir.path().to_path_buf()))
}

/// Fresh file-backed device storage.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
#[allow(clippy::expect_used)]
pub fn device() -> (TempDir, SharedStorage) {
    let dir = TempDir::new().expect("create storage dir");
    let storage = FileStorage::open(dir.path().join("device")).expect("open device storage");
    (dir, Arc::new(storage))
}

#[allow(clippy::expect_used)]
fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write shop document");
}
