//! Order message builder and WhatsApp deep links.
//!
//! [`build_order_message`] turns a cart into the plain-text summary the
//! shopper sends to the shop. It either returns a complete message or an
//! [`OrderError`]; it never produces a partial message. Percent-encoding the
//! text into a link is done separately by [`whatsapp_link`].

use std::fmt;

use acchiappasogni_core::{DeliveryMethod, PhoneNumber};
use thiserror::Error;
use url::Url;

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::config::ShopConfig;
use crate::pricing::compute_totals;

/// Message sent by the "custom dreamcatcher" button.
pub const CUSTOM_REQUEST_MESSAGE: &str =
    "Ciao! Vorrei un acchiappasogni personalizzato 😊\nMi dici tempi e prezzo?";

/// Checkout form field that must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    Street,
    PostalCode,
    City,
}

impl RequiredField {
    /// Label used both in messages and in validation errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Street => "Street",
            Self::PostalCode => "Postal code",
            Self::City => "City",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Checkout form fields left blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", join_fields(.missing))]
pub struct ValidationError {
    pub missing: Vec<RequiredField>,
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why an order cannot be sent.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No cart entry refers to a product in the catalog.
    #[error("the cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The shop config has no WhatsApp number.
    #[error("no WhatsApp number configured in config.json")]
    NotConfigured,

    #[error("cannot build WhatsApp link: {0}")]
    Link(#[from] url::ParseError),
}

/// What the shopper typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFields {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub notes: String,
    /// Name of a saved dreamcatcher design to mention in the order.
    pub design: Option<String>,
}

impl CustomerFields {
    /// Check the fields required for `delivery`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every blank address field when
    /// shipping.
    pub fn validate(&self, delivery: DeliveryMethod) -> Result<(), ValidationError> {
        if delivery == DeliveryMethod::Pickup {
            return Ok(());
        }

        let missing: Vec<RequiredField> = [
            (RequiredField::Street, &self.street),
            (RequiredField::PostalCode, &self.postal_code),
            (RequiredField::City, &self.city),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }
}

/// A finished order message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage(String);

impl OrderMessage {
    /// The message text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the message text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the order summary.
///
/// The output is deterministic for the same inputs. Address lines appear
/// only for shipping orders.
///
/// # Errors
///
/// - [`OrderError::EmptyCart`] if no cart entry resolves to a product
/// - [`OrderError::Validation`] if a shipping order is missing address fields
pub fn build_order_message(
    cart: &Cart,
    catalog: &Catalog,
    customer: &CustomerFields,
    delivery: DeliveryMethod,
    config: &ShopConfig,
) -> Result<OrderMessage, OrderError> {
    if cart.resolved_lines(catalog).next().is_none() {
        return Err(OrderError::EmptyCart);
    }
    customer.validate(delivery)?;

    let totals = compute_totals(cart, catalog, delivery, config);
    let mut lines = vec![config.whatsapp_prefill.trim().to_string(), String::new()];

    lines.extend(cart.resolved_lines(catalog).map(|line| {
        let title = if line.product.title.trim().is_empty() {
            line.product.id.as_str()
        } else {
            line.product.title.trim()
        };
        format!(
            "- {} × {} — {}",
            line.quantity,
            title,
            config.format(line.product.price)
        )
    }));
    lines.push(String::new());

    lines.push(format!("Delivery: {}", delivery.label()));
    lines.push(format!("Subtotal: {}", config.format(totals.subtotal)));
    lines.push(format!("Shipping: {}", config.format(totals.shipping)));
    lines.push(format!("Total: {}", config.format(totals.total)));
    if let Some(hint) = totals.hint.text(config.currency) {
        lines.push(format!("({hint})"));
    }
    lines.push(String::new());

    let mut fields = vec![("Name", &customer.name), ("Phone", &customer.phone)];
    if delivery == DeliveryMethod::Shipping {
        fields.push((RequiredField::Street.label(), &customer.street));
        fields.push((RequiredField::PostalCode.label(), &customer.postal_code));
        fields.push((RequiredField::City.label(), &customer.city));
    }
    fields.push(("Notes", &customer.notes));
    lines.extend(
        fields
            .into_iter()
            .filter_map(|(label, value)| field_line(label, value)),
    );

    if let Some(design) = customer.design.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        lines.push(String::new());
        lines.push(format!("Custom design: {design} (PNG attached)"));
    }

    Ok(OrderMessage(lines.join("\n").trim_end().to_string()))
}

/// `label: value`, or nothing for a blank value.
fn field_line(label: &str, value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| format!("{label}: {value}"))
}

/// `https://wa.me/<digits>?text=<percent-encoded message>`.
///
/// # Errors
///
/// Returns an error if the resulting URL does not parse.
pub fn whatsapp_link(phone: &PhoneNumber, message: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "https://wa.me/{}?text={}",
        phone.digits(),
        urlencoding::encode(message)
    ))
}

/// Deep link for a custom dreamcatcher request.
///
/// # Errors
///
/// Returns [`OrderError::NotConfigured`] if the shop has no WhatsApp number.
pub fn custom_request_link(config: &ShopConfig) -> Result<Url, OrderError> {
    let phone = config
        .whatsapp_number
        .as_ref()
        .ok_or(OrderError::NotConfigured)?;
    Ok(whatsapp_link(phone, CUSTOM_REQUEST_MESSAGE)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use acchiappasogni_core::{Money, ProductId};

    use super::*;

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn fixture() -> (Cart, Catalog, ShopConfig) {
        let catalog = Catalog::parse(
            r#"[
                {"id": "A", "title": "Luna piena", "price": 10, "featured": true},
                {"id": "B", "title": "Piuma", "price": 5}
            ]"#,
        )
        .unwrap();

        let mut cart = Cart::new();
        cart.set(id("A"), 2.0);
        cart.set(id("B"), 1.0);

        let config = ShopConfig {
            whatsapp_number: Some(PhoneNumber::parse("393401234567").unwrap()),
            shipping_fee: Money::from_cents(500).unwrap(),
            free_shipping_threshold: Some(Money::from_cents(3000).unwrap()),
            ..ShopConfig::default()
        };

        (cart, catalog, config)
    }

    fn address() -> CustomerFields {
        CustomerFields {
            name: "Giulia".to_string(),
            street: "Via Roma 1".to_string(),
            postal_code: "00100".to_string(),
            city: "Roma".to_string(),
            ..CustomerFields::default()
        }
    }

    #[test]
    fn test_shipping_message() {
        let (cart, catalog, config) = fixture();
        let msg = build_order_message(&cart, &catalog, &address(), DeliveryMethod::Shipping, &config)
            .unwrap();
        let text = msg.as_str();

        assert!(text.starts_with("Ciao! Vorrei ordinare questi acchiappasogni:\n"));
        assert!(text.contains("- 2 × Luna piena — 10,00 €\n- 1 × Piuma — 5,00 €"));
        assert!(text.contains("Delivery: Shipping"));
        assert!(text.contains("Subtotal: 25,00 €"));
        assert!(text.contains("Shipping: 5,00 €"));
        assert!(text.contains("Total: 30,00 €"));
        assert!(text.contains("(spend 5,00 € more for free shipping)"));
        assert!(text.contains("Street: Via Roma 1\nPostal code: 00100\nCity: Roma"));
        assert!(!text.contains("Phone:"));
    }

    #[test]
    fn test_pickup_message_layout() {
        let (cart, catalog, config) = fixture();
        let customer = CustomerFields {
            name: " Giulia ".to_string(),
            phone: "340 1234567".to_string(),
            notes: "Entro venerdì".to_string(),
            design: Some("Luna blu".to_string()),
            ..CustomerFields::default()
        };
        let text = build_order_message(&cart, &catalog, &customer, DeliveryMethod::Pickup, &config)
            .unwrap()
            .into_inner();

        assert_eq!(
            text,
            [
                "Ciao! Vorrei ordinare questi acchiappasogni:",
                "",
                "- 2 × Luna piena — 10,00 €",
                "- 1 × Piuma — 5,00 €",
                "",
                "Delivery: Pickup",
                "Subtotal: 25,00 €",
                "Shipping: 0,00 €",
                "Total: 25,00 €",
                "",
                "Name: Giulia",
                "Phone: 340 1234567",
                "Notes: Entro venerdì",
                "",
                "Custom design: Luna blu (PNG attached)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_deterministic() {
        let (cart, catalog, config) = fixture();
        let a = build_order_message(&cart, &catalog, &address(), DeliveryMethod::Shipping, &config)
            .unwrap();
        let b = build_order_message(&cart, &catalog, &address(), DeliveryMethod::Shipping, &config)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pickup_omits_address_labels() {
        let (cart, catalog, config) = fixture();
        let customer = CustomerFields {
            name: "Giulia".to_string(),
            street: "Via Roma 1".to_string(),
            ..CustomerFields::default()
        };
        let text = build_order_message(&cart, &catalog, &customer, DeliveryMethod::Pickup, &config)
            .unwrap()
            .into_inner();

        assert!(text.contains("Delivery: Pickup"));
        assert!(!text.contains("Street"));
        assert!(!text.contains("Postal code"));
        assert!(!text.contains("City"));
        assert!(text.contains("Shipping: 0,00 €"));
    }

    #[test]
    fn test_shipping_missing_fields_is_validation_error() {
        let (cart, catalog, config) = fixture();
        let customer = CustomerFields {
            street: "Via Roma 1".to_string(),
            city: "  ".to_string(),
            ..CustomerFields::default()
        };
        let err = build_order_message(&cart, &catalog, &customer, DeliveryMethod::Shipping, &config)
            .unwrap_err();

        match err {
            OrderError::Validation(v) => {
                assert_eq!(v.missing, vec![RequiredField::PostalCode, RequiredField::City]);
                assert_eq!(v.to_string(), "missing required fields: Postal code, City");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_or_dangling_cart() {
        let (_, catalog, config) = fixture();
        let mut cart = Cart::new();
        assert!(matches!(
            build_order_message(&cart, &catalog, &address(), DeliveryMethod::Pickup, &config),
            Err(OrderError::EmptyCart)
        ));

        cart.set(id("gone"), 3.0);
        assert!(matches!(
            build_order_message(&cart, &catalog, &address(), DeliveryMethod::Pickup, &config),
            Err(OrderError::EmptyCart)
        ));
    }

    #[test]
    fn test_design_note() {
        let (cart, catalog, config) = fixture();
        let customer = CustomerFields {
            design: Some("Luna blu".to_string()),
            ..CustomerFields::default()
        };
        let text = build_order_message(&cart, &catalog, &customer, DeliveryMethod::Pickup, &config)
            .unwrap()
            .into_inner();
        assert!(text.ends_with("Custom design: Luna blu (PNG attached)"));
    }

    #[test]
    fn test_whatsapp_link_encodes_text() {
        let phone = PhoneNumber::parse("+39 340 1234567").unwrap();
        let url = whatsapp_link(&phone, "Ciao! 2 × Luna\nTotale: 5,00 €").unwrap();

        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/393401234567");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "text");
        assert_eq!(value, "Ciao! 2 × Luna\nTotale: 5,00 €");
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_custom_request_link() {
        assert!(matches!(
            custom_request_link(&ShopConfig::default()),
            Err(OrderError::NotConfigured)
        ));

        let (_, _, config) = fixture();
        let url = custom_request_link(&config).unwrap();
        let (_, text) = url.query_pairs().next().unwrap();
        assert_eq!(text, CUSTOM_REQUEST_MESSAGE);
    }
}
