//! Storefront configuration.
//!
//! Two layers:
//!
//! - [`ShopConfig`] - the shop's `config.json` document (brand, contact phone,
//!   shipping rules). Every field is optional; a missing or malformed document
//!   means defaults.
//! - [`StorefrontConfig`] - where to find the documents and device storage,
//!   loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ACCHIAPPASOGNI_DATA_SOURCE` - Base URL (`http(s)://...`) or directory
//!   holding `products.json` and `config.json` (default: `data`)
//! - `ACCHIAPPASOGNI_STORAGE_DIR` - Device storage directory
//!   (default: `.acchiappasogni`)

use std::path::PathBuf;

use acchiappasogni_core::{CurrencyCode, Money, PhoneNumber};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::{DataSource, strip_bom};

/// Default shop name.
pub const DEFAULT_BRAND_NAME: &str = "Acchiappasogni di Erika";

/// Default first line of order messages.
pub const DEFAULT_WHATSAPP_PREFILL: &str = "Ciao! Vorrei ordinare questi acchiappasogni:";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

// =============================================================================
// Shop document
// =============================================================================

/// Shop settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// Display name of the shop.
    pub brand_name: String,
    /// Number orders are sent to. `None` blocks checkout.
    pub whatsapp_number: Option<PhoneNumber>,
    /// Greeting line that opens every order message.
    pub whatsapp_prefill: String,
    /// Flat shipping fee.
    pub shipping_fee: Money,
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Option<Money>,
    /// Currency prices are shown in.
    pub currency: CurrencyCode,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            brand_name: DEFAULT_BRAND_NAME.to_string(),
            whatsapp_number: None,
            whatsapp_prefill: DEFAULT_WHATSAPP_PREFILL.to_string(),
            shipping_fee: Money::ZERO,
            free_shipping_threshold: None,
            currency: CurrencyCode::default(),
        }
    }
}

/// `config.json` as written by hand.
///
/// Money fields come in major units (`shippingFee: 4.5`) or minor units
/// (`shippingFeeCents: 450`); the phone number may be a string or a number.
/// Fields are kept as raw values so one bad field cannot sink the document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawShopConfig {
    brand_name: Option<Value>,
    #[serde(alias = "contactPhoneNumber")]
    whatsapp_number: Option<Value>,
    whatsapp_prefill: Option<Value>,
    shipping_fee: Option<Value>,
    shipping_fee_cents: Option<Value>,
    free_shipping_threshold: Option<Value>,
    free_shipping_threshold_cents: Option<Value>,
    currency: Option<Value>,
}

impl ShopConfig {
    /// Parse a config document.
    ///
    /// Individual fields that fail validation fall back to their default
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the document is not a JSON object of
    /// the expected shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawShopConfig = serde_json::from_str(strip_bom(text))?;
        Ok(Self::from_raw(raw))
    }

    /// Parse a config document, falling back to defaults on any error.
    #[must_use]
    pub fn from_json_or_default(text: &str) -> Self {
        Self::from_json(text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed shop config, using defaults");
            Self::default()
        })
    }

    fn from_raw(raw: RawShopConfig) -> Self {
        let defaults = Self::default();

        let whatsapp_number = raw
            .whatsapp_number
            .as_ref()
            .and_then(|v| match v {
                Value::String(s) if s.trim().is_empty() => None,
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .and_then(|s| match PhoneNumber::parse(&s) {
                Ok(phone) => Some(phone),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring invalid whatsappNumber");
                    None
                }
            });

        let shipping_fee = money_field(
            "shippingFee",
            raw.shipping_fee_cents.as_ref(),
            raw.shipping_fee.as_ref(),
        )
        .unwrap_or(defaults.shipping_fee);

        let free_shipping_threshold = money_field(
            "freeShippingThreshold",
            raw.free_shipping_threshold_cents.as_ref(),
            raw.free_shipping_threshold.as_ref(),
        );

        let currency = text_field("currency", raw.currency.as_ref())
            .and_then(|code| {
                let parsed = CurrencyCode::from_code(code);
                if parsed.is_none() {
                    tracing::warn!(currency = code, "unsupported currency, using default");
                }
                parsed
            })
            .unwrap_or(defaults.currency);

        Self {
            brand_name: text_field("brandName", raw.brand_name.as_ref())
                .map_or(defaults.brand_name, str::to_string),
            whatsapp_number,
            whatsapp_prefill: text_field("whatsappPrefill", raw.whatsapp_prefill.as_ref())
                .map_or(defaults.whatsapp_prefill, str::to_string),
            shipping_fee,
            free_shipping_threshold,
            currency,
        }
    }

    /// Format an amount in the shop currency.
    #[must_use]
    pub fn format(&self, amount: Money) -> String {
        amount.format(self.currency)
    }
}

/// Read a non-blank string field. Other JSON types are ignored with a warning.
fn text_field<'a>(name: &str, value: Option<&'a Value>) -> Option<&'a str> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => {
            tracing::warn!(field = name, value = %other, "ignoring non-text field");
            None
        }
    }
}

/// Read a money field given in minor units (preferred) or major units.
fn money_field(name: &str, cents: Option<&Value>, major: Option<&Value>) -> Option<Money> {
    let parsed = match (cents.filter(|v| !v.is_null()), major.filter(|v| !v.is_null())) {
        (Some(v), _) => Money::from_cents_json(v),
        (None, Some(v)) => Money::from_major_json(v),
        (None, None) => return None,
    };
    match parsed {
        Ok(money) => Some(money),
        Err(e) => {
            tracing::warn!(field = name, error = %e, "ignoring invalid money field");
            None
        }
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Where the storefront reads documents from and keeps device state.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Products/config document source.
    pub data_source: DataSource,
    /// Device storage directory.
    pub storage_dir: PathBuf,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let data_source = get_env_or_default("ACCHIAPPASOGNI_DATA_SOURCE", "data")
            .parse::<DataSource>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ACCHIAPPASOGNI_DATA_SOURCE".to_string(), e.to_string())
            })?;
        let storage_dir =
            PathBuf::from(get_env_or_default("ACCHIAPPASOGNI_STORAGE_DIR", ".acchiappasogni"));

        Ok(Self {
            data_source,
            storage_dir,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
