//! Subtotal, shipping and total for a cart.

use acchiappasogni_core::{CurrencyCode, DeliveryMethod, Money};

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::config::ShopConfig;

/// Free-shipping hint shown under the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShippingHint {
    /// Pickup, or no threshold configured.
    #[default]
    None,
    /// The subtotal reached the threshold; shipping is waived.
    FreeShippingReached,
    /// Amount still missing to reach the threshold.
    SpendMore(Money),
}

impl ShippingHint {
    /// Human-readable hint, if any.
    #[must_use]
    pub fn text(self, currency: CurrencyCode) -> Option<String> {
        match self {
            Self::None => None,
            Self::FreeShippingReached => Some("free shipping achieved".to_string()),
            Self::SpendMore(missing) => Some(format!(
                "spend {} more for free shipping",
                missing.format(currency)
            )),
        }
    }
}

/// Computed totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub hint: ShippingHint,
}

/// Price a cart.
///
/// Pure: entries whose product is no longer in `catalog` are skipped, and
/// the result does not depend on cart order.
#[must_use]
pub fn compute_totals(
    cart: &Cart,
    catalog: &Catalog,
    delivery: DeliveryMethod,
    config: &ShopConfig,
) -> Totals {
    let subtotal = cart
        .resolved_lines(catalog)
        .fold(Money::ZERO, |acc, line| {
            acc.saturating_add(line.product.price.times(line.quantity))
        });

    let (shipping, hint) = match (delivery, config.free_shipping_threshold) {
        (DeliveryMethod::Pickup, _) => (Money::ZERO, ShippingHint::None),
        (DeliveryMethod::Shipping, None) => (config.shipping_fee, ShippingHint::None),
        (DeliveryMethod::Shipping, Some(threshold)) if subtotal >= threshold => {
            (Money::ZERO, ShippingHint::FreeShippingReached)
        }
        (DeliveryMethod::Shipping, Some(threshold)) => (
            config.shipping_fee,
            ShippingHint::SpendMore(threshold.saturating_sub(subtotal)),
        ),
    };

    Totals {
        subtotal,
        shipping,
        total: subtotal.saturating_add(shipping),
        hint,
    }
}
