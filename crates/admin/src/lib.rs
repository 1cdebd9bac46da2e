//! Acchiappasogni admin library.
//!
//! PIN-gated editor for the device-local catalog override.
//!
//! # Security
//!
//! This is a single-device, single-operator tool. The PIN keeps a casual
//! visitor out of the editor on a shared phone; it is not an access-control
//! boundary for the shared products document, which lives on a static host.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod editor;
pub mod error;
pub mod gate;

pub use editor::{AdminEditor, MAX_IMAGE_BYTES, ProductDraft, ProductPatch};
pub use error::AdminError;
pub use gate::{AdminGate, DEFAULT_PIN};
