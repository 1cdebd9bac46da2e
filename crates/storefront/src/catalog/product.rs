//! Product records and load-time normalization.
//!
//! Product documents are hand-edited JSON and have accumulated several
//! spellings of the same facts over time. [`RawProduct`] accepts all of them;
//! [`Product`] is the single canonical shape everything else works with.

use acchiappasogni_core::{IdError, Money, MoneyError, ProductId};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a product entry cannot be normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// No `id` field, or a null one.
    #[error("product has no id")]
    MissingId,

    /// The id is blank or not a string/number.
    #[error("invalid product id: {0}")]
    InvalidId(#[from] IdError),

    /// A price field is present but unusable.
    #[error("invalid {field}: {source}")]
    InvalidPrice {
        field: &'static str,
        #[source]
        source: MoneyError,
    },

    /// `createdAt` is neither RFC 3339 nor epoch milliseconds.
    #[error("invalid createdAt: {0}")]
    InvalidTimestamp(String),
}

/// A purchasable item.
///
/// Serializes with the canonical field set only: `priceCents` is always
/// written, the legacy `price`/`price_from` fields never are. Unknown fields
/// from the source document ride along in [`Product::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProduct", rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub category: String,
    #[serde(rename = "priceCents")]
    pub price: Money,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with only the required fields set.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            title: title.into(),
            category: String::new(),
            price,
            image: String::new(),
            description: None,
            featured: false,
            created_at: None,
            tags: Vec::new(),
            in_stock: None,
            extra: Map::new(),
        }
    }

    /// Whether the product can currently be ordered. Missing means yes.
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.in_stock.unwrap_or(true)
    }

    /// Whether the product has a usable image reference.
    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image.trim().is_empty()
    }
}

/// Product entry as it appears in any historical document variant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    id: Option<Value>,
    title: Option<String>,
    category: Option<String>,
    price_cents: Option<Value>,
    price: Option<Value>,
    #[serde(rename = "price_from")]
    price_from: Option<Value>,
    image: Option<String>,
    description: Option<String>,
    featured: Option<bool>,
    created_at: Option<Value>,
    tags: Option<Vec<String>>,
    in_stock: Option<bool>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawProduct> for Product {
    type Error = ProductError;

    fn try_from(raw: RawProduct) -> Result<Self, Self::Error> {
        let id = match raw.id {
            None | Some(Value::Null) => return Err(ProductError::MissingId),
            Some(Value::String(s)) => ProductId::parse(&s)?,
            Some(Value::Number(n)) => ProductId::parse(&n.to_string())?,
            Some(_) => return Err(ProductError::InvalidId(IdError::Empty)),
        };

        let price = normalize_price(
            raw.price_cents.as_ref(),
            raw.price.as_ref(),
            raw.price_from.as_ref(),
        )?;

        let created_at = raw.created_at.as_ref().map(parse_timestamp).transpose()?.flatten();

        Ok(Self {
            id,
            title: raw.title.unwrap_or_default().trim().to_string(),
            category: raw.category.unwrap_or_default().trim().to_string(),
            price,
            image: raw.image.unwrap_or_default(),
            description: raw.description.filter(|d| !d.trim().is_empty()),
            featured: raw.featured.unwrap_or(false),
            created_at,
            tags: raw.tags.unwrap_or_default(),
            in_stock: raw.in_stock,
            extra: raw.extra,
        })
    }
}

/// Pick the price from whichever field the document used.
///
/// Priority: `priceCents` (minor units), then `price`, then `price_from`
/// (both major units). Null fields count as absent. No field at all is a
/// price of zero.
fn normalize_price(
    cents: Option<&Value>,
    major: Option<&Value>,
    legacy_major: Option<&Value>,
) -> Result<Money, ProductError> {
    fn present(v: Option<&Value>) -> Option<&Value> {
        v.filter(|v| !v.is_null())
    }

    if let Some(v) = present(cents) {
        return Money::from_cents_json(v).map_err(|source| ProductError::InvalidPrice {
            field: "priceCents",
            source,
        });
    }
    if let Some(v) = present(major) {
        return Money::from_major_json(v).map_err(|source| ProductError::InvalidPrice {
            field: "price",
            source,
        });
    }
    if let Some(v) = present(legacy_major) {
        return Money::from_major_json(v).map_err(|source| ProductError::InvalidPrice {
            field: "price_from",
            source,
        });
    }
    Ok(Money::ZERO)
}

fn parse_timestamp(value: &Value) -> Result<Option<DateTime<Utc>>, ProductError> {
    let invalid = || ProductError::InvalidTimestamp(value.to_string());
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let millis = n.as_i64().ok_or_else(invalid)?;
            Utc.timestamp_millis_opt(millis).single().map(Some).ok_or_else(invalid)
        }
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            if let Ok(millis) = s.trim().parse::<i64>() {
                return Utc
                    .timestamp_millis_opt(millis)
                    .single()
                    .map(Some)
                    .ok_or_else(invalid);
            }
            DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}
