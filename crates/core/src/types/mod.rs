//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;
pub mod pin;
pub mod price;
pub mod status;

pub use id::*;
pub use phone::{PhoneError, PhoneNumber};
pub use pin::StoredPinHash;
pub use price::{CurrencyCode, Money, MoneyError};
pub use status::*;
