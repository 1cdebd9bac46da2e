//! Type-safe money representation in integer minor units.
//!
//! Catalog documents have historically carried prices both as decimal euros
//! (`price`, `price_from`) and as integer cents (`priceCents`). Everything
//! past the loader works on [`Money`], which always holds minor units, so no
//! code branches on which form the input used.

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("not a valid amount: {0:?}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit in minor units.
    #[error("amount is too large")]
    Overflow,
}

/// A non-negative amount of money in minor units (cents).
///
/// ## Examples
///
/// ```
/// use acchiappasogni_core::Money;
///
/// let price = Money::parse_major("12,5").unwrap();
/// assert_eq!(price.cents(), 1250);
/// assert_eq!(price.to_string(), "12,50 €");
///
/// assert!(Money::parse_major("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor units.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative input.
    pub const fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self(cents))
    }

    /// Create an amount from a decimal in major units, rounding half away
    /// from zero to whole cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or does not fit in `i64`
    /// minor units.
    pub fn from_major(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cents = rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.to_i64())
            .ok_or(MoneyError::Overflow)?;
        Ok(Self(cents))
    }

    /// Parse a decimal amount in major units.
    ///
    /// Accepts either `.` or `,` as the decimal separator and an optional
    /// trailing or leading `€`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number, is negative, or overflows.
    pub fn parse_major(s: &str) -> Result<Self, MoneyError> {
        let cleaned = s.trim().trim_matches('€').trim().replace(',', ".");
        let amount =
            Decimal::from_str(&cleaned).map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::from_major(amount)
    }

    /// Convert a JSON value holding major units (number or numeric string).
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric values and for amounts rejected by
    /// [`Money::from_major`].
    pub fn from_major_json(value: &serde_json::Value) -> Result<Self, MoneyError> {
        match value {
            serde_json::Value::Number(n) => Self::parse_major(&n.to_string()),
            serde_json::Value::String(s) => Self::parse_major(s),
            other => Err(MoneyError::Invalid(other.to_string())),
        }
    }

    /// Convert a JSON value holding minor units (integer number or string).
    ///
    /// # Errors
    ///
    /// Returns an error for non-integer values or negative amounts.
    pub fn from_cents_json(value: &serde_json::Value) -> Result<Self, MoneyError> {
        let cents = match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| MoneyError::Invalid(value.to_string()))?;
        Self::from_cents(cents)
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount in major units as an exact decimal.
    #[must_use]
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Add, saturating at `i64::MAX` minor units.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtract, saturating at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0.saturating_sub(other.0);
        if diff < 0 { Self::ZERO } else { Self(diff) }
    }

    /// Multiply by a quantity, saturating at `i64::MAX` minor units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Format in the given currency, Italian style (`1.234,50 €`).
    #[must_use]
    pub fn format(self, currency: CurrencyCode) -> String {
        let units = self.0 / 100;
        let cents = self.0 % 100;

        let digits = units.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{grouped},{cents:02} {}", currency.symbol())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(CurrencyCode::default()))
    }
}

impl TryFrom<i64> for Money {
    type Error = MoneyError;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        Self::from_cents(cents)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_major(s)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

/// ISO 4217 currency codes the shop can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CHF,
}

impl CurrencyCode {
    /// Look up a supported currency by its ISO code, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "EUR" => Some(Self::EUR),
            "USD" => Some(Self::USD),
            "GBP" => Some(Self::GBP),
            "CHF" => Some(Self::CHF),
            _ => None,
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::USD => "$",
            Self::GBP => "£",
            Self::CHF => "CHF",
        }
    }
}
