//! Closed enums shared by the storefront, the admin editor and the CLI.

use serde::{Deserialize, Serialize};

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Collected in person; never charged shipping.
    Pickup,
    /// Shipped to an address; flat fee subject to the free-shipping threshold.
    #[default]
    Shipping,
}

impl DeliveryMethod {
    /// Human-readable label used in order messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pickup => "Pickup",
            Self::Shipping => "Shipping",
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pickup => write!(f, "pickup"),
            Self::Shipping => write!(f, "shipping"),
        }
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickup" | "ritiro" => Ok(Self::Pickup),
            "shipping" | "spedizione" => Ok(Self::Shipping),
            _ => Err(format!("invalid delivery method: {s}")),
        }
    }
}

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Featured first, then newest first.
    #[default]
    Featured,
    /// Newest first by creation time.
    Newest,
    /// Alphabetical by title.
    Title,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Featured => write!(f, "featured"),
            Self::Newest => write!(f, "newest"),
            Self::Title => write!(f, "title"),
            Self::PriceAsc => write!(f, "price-asc"),
            Self::PriceDesc => write!(f, "price-desc"),
        }
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured" => Ok(Self::Featured),
            "newest" => Ok(Self::Newest),
            "title" => Ok(Self::Title),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort mode: {s}")),
        }
    }
}
