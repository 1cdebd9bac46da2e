//! Browse, fill the cart and check out, end to end over a data directory.

#![allow(clippy::unwrap_used)]

use acchiappasogni_core::{DeliveryMethod, SortMode};
use acchiappasogni_integration_tests::{CONFIG_JSON, PRODUCTS_JSON, data_dir, device, directory_loader};
use acchiappasogni_storefront::order::{CustomerFields, OrderError, RequiredField};
use acchiappasogni_storefront::pricing::ShippingHint;
use acchiappasogni_storefront::search::CategoryFilter;
use acchiappasogni_storefront::state::Storefront;
use acchiappasogni_storefront::storage::SharedStorage;

fn shipping_customer() -> CustomerFields {
    CustomerFields {
        name: "Giulia".to_string(),
        phone: "3331234567".to_string(),
        street: "Via Roma 1".to_string(),
        postal_code: "00100".to_string(),
        city: "Roma".to_string(),
        ..CustomerFields::default()
    }
}

#[tokio::test]
async fn test_browse_filters_and_sorts() {
    let data = data_dir(PRODUCTS_JSON, CONFIG_JSON);
    let (_dir, storage) = device();
    let mut shop = Storefront::open(&directory_loader(&data), storage).await;

    shop.query.category = CategoryFilter::parse("Acchiappasogni Classici");
    shop.sort = SortMode::PriceDesc;
    let ids: Vec<&str> = shop.visible_products().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["AE-3", "AE-1"]);

    // Accent-insensitive search
    shop.query.category = CategoryFilter::All;
    shop.query.query = "eclisse".to_string();
    let ids: Vec<&str> = shop.visible_products().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["AE-3"]);

    shop.query.query.clear();
    shop.query.in_stock_only = true;
    assert_eq!(shop.visible_products().len(), 2);
}

#[tokio::test]
async fn test_worked_example_totals_and_message() {
    let data = data_dir(PRODUCTS_JSON, CONFIG_JSON);
    let (_dir, storage) = device();
    let mut shop = Storefront::open(&directory_loader(&data), storage).await;

    let _ = shop.set_quantity("AE-1", 2.0).unwrap();
    let update = shop.add_to_cart("AE-2").unwrap();
    assert_eq!(update.total_items, 3);

    let totals = shop.totals();
    assert_eq!(totals.subtotal.cents(), 2500);
    assert_eq!(totals.shipping.cents(), 500);
    assert_eq!(totals.total.cents(), 3000);
    assert!(matches!(totals.hint, ShippingHint::SpendMore(m) if m.cents() == 500));

    let message = shop.order_message(&shipping_customer()).unwrap();
    let text = message.as_str();
    assert!(text.contains("- 2 × Luna d'Argento — 10,00 €"));
    assert!(text.contains("- 1 × Piuma Blu — 5,00 €"));
    assert!(text.contains("Delivery: Shipping"));
    assert!(text.contains("Total: 30,00 €"));
    assert!(text.contains("(spend 5,00 € more for free shipping)"));
    assert!(text.contains("City: Roma"));

    let link = shop.checkout_link(&shipping_customer()).unwrap();
    assert_eq!(link.host_str(), Some("wa.me"));
    assert_eq!(link.path(), "/393401234567");
    let (key, decoded) = link.query_pairs().next().unwrap();
    assert_eq!(key, "text");
    assert_eq!(decoded, text);
}

#[tokio::test]
async fn test_free_shipping_and_pickup() {
    let data = data_dir(PRODUCTS_JSON, CONFIG_JSON);
    let (_dir, storage) = device();
    let mut shop = Storefront::open(&directory_loader(&data), storage).await;

    let _ = shop.set_quantity("AE-1", 3.0).unwrap();
    let totals = shop.totals();
    assert_eq!(totals.shipping.cents(), 0);
    assert_eq!(totals.total.cents(), 3000);
    assert_eq!(totals.hint, ShippingHint::FreeShippingReached);

    shop.delivery = DeliveryMethod::Pickup;
    let totals = shop.totals();
    assert_eq!(totals.hint, ShippingHint::None);
    // Pickup needs no address
    let message = shop.order_message(&CustomerFields::default()).unwrap();
    assert!(message.as_str().contains("Delivery: Pickup"));
    assert!(!message.as_str().contains("Street"));
}

#[tokio::test]
async fn test_shipping_requires_address() {
    let data = data_dir(PRODUCTS_JSON, CONFIG_JSON);
    let (_dir, storage) = device();
    let mut shop = Storefront::open(&directory_loader(&data), storage).await;
    let _ = shop.add_to_cart("AE-1").unwrap();

    let customer = CustomerFields {
        street: "Via Roma 1".to_string(),
        ..CustomerFields::default()
    };
    match shop.checkout_link(&customer) {
        Err(OrderError::Validation(e)) => {
            assert_eq!(e.missing, vec![RequiredField::PostalCode, RequiredField::City]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cart_survives_restart_and_ignores_removed_products() {
    let data = data_dir(PRODUCTS_JSON, CONFIG_JSON);
    let (_dir, storage) = device();
    let loader = directory_loader(&data);

    let mut shop = Storefront::open(&loader, SharedStorage::clone(&storage)).await;
    let _ = shop.set_quantity("AE-1", 2.0).unwrap();
    let _ = shop.set_quantity("AE-3", 1.0).unwrap();

    // AE-3 disappears from the shared catalog
    let only_first = r#"[{"id": "AE-1", "title": "Luna d'Argento", "priceCents": 1000}]"#;
    std::fs::write(data.path().join("products.json"), only_first).unwrap();

    let shop = Storefront::open(&loader, storage).await;
    assert_eq!(shop.cart().total_item_count(), 3);
    assert_eq!(shop.totals().subtotal.cents(), 2000);
}

#[tokio::test]
async fn test_custom_request_link() {
    let data = data_dir(PRODUCTS_JSON, CONFIG_JSON);
    let (_dir, storage) = device();
    let shop = Storefront::open(&directory_loader(&data), storage).await;

    let link = shop.custom_request_link().unwrap();
    assert_eq!(link.path(), "/393401234567");
    assert!(link.query().unwrap().starts_with("text="));

    let without_number = data_dir(PRODUCTS_JSON, "{}");
    let (_dir, storage) = device();
    let shop = Storefront::open(&directory_loader(&without_number), storage).await;
    assert!(matches!(shop.custom_request_link(), Err(OrderError::NotConfigured)));
}
