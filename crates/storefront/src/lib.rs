//! Acchiappasogni storefront library.
//!
//! Everything a shopper's session needs, with no UI attached: catalog
//! loading, filtering and sorting, the persisted cart, totals, the WhatsApp
//! order message, the dreamcatcher configurator and device storage.
//! [`state::Storefront`] ties them together for a surface such as the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod designer;
pub mod error;
pub mod order;
pub mod pricing;
pub mod search;
pub mod state;
pub mod storage;
