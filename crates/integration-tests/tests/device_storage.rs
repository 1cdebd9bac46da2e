//! File-backed device storage.

#![allow(clippy::unwrap_used)]

use acchiappasogni_integration_tests::device;
use acchiappasogni_storefront::cart::CartStore;
use acchiappasogni_storefront::storage::{DeviceStorage, FileStorage, SharedStorage, keys};
use acchiappasogni_core::ProductId;

#[test]
fn test_values_survive_reopen() {
    let (dir, storage) = device();
    storage.set(keys::ADMIN_UNLOCKED, "1").unwrap();
    storage.set(keys::CART, r#"{"AE-1": 2}"#).unwrap();
    drop(storage);

    let reopened = FileStorage::open(dir.path().join("device")).unwrap();
    assert_eq!(reopened.get(keys::ADMIN_UNLOCKED).unwrap().as_deref(), Some("1"));
    assert_eq!(reopened.get(keys::CART).unwrap().as_deref(), Some(r#"{"AE-1": 2}"#));
}

#[test]
fn test_remove_and_missing() {
    let (_dir, storage) = device();
    assert_eq!(storage.get(keys::DESIGNS).unwrap(), None);

    storage.set(keys::DESIGNS, "{}").unwrap();
    storage.remove(keys::DESIGNS).unwrap();
    assert_eq!(storage.get(keys::DESIGNS).unwrap(), None);

    // Removing twice is fine
    storage.remove(keys::DESIGNS).unwrap();
}

#[test]
fn test_cart_persists_through_file_storage() {
    let (_dir, storage) = device();
    let mut cart = CartStore::load(SharedStorage::clone(&storage));
    let update = cart.set_quantity(ProductId::parse("AE-2").unwrap(), 3.0);
    assert!(update.storage_warning.is_none());

    let reloaded = CartStore::load(storage);
    assert_eq!(reloaded.cart().quantity("AE-2"), 3);
}

#[test]
fn test_corrupt_cart_starts_empty() {
    let (_dir, storage) = device();
    storage.set(keys::CART, "[1, 2, 3").unwrap();

    let cart = CartStore::load(storage);
    assert_eq!(cart.total_item_count(), 0);
}
