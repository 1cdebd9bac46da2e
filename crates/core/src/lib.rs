//! Acchiappasogni Core - Shared types library.
//!
//! This crate provides common types used across all storefront components:
//! - `storefront` - Catalog, cart, pricing, checkout and the dreamcatcher designer
//! - `admin` - PIN-gated catalog override editor
//! - `cli` - Command-line surface driving both
//!
//! # Architecture
//!
//! The core crate contains only types and parsing - no I/O, no storage,
//! no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product ids, money, phone numbers, PIN
//!   hashes, and the storefront's closed enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
