//! Unified error type for storefront operations.
//!
//! Every module has its own error enum; [`AppError`] wraps them so a surface
//! (the CLI, a test harness) can use a single `Result`.

use thiserror::Error;

use crate::catalog::{CatalogError, LoadError};
use crate::config::ConfigError;
use crate::designer::DesignError;
use crate::order::OrderError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Device storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The catalog could not be loaded.
    #[error("Catalog unavailable: {0}")]
    Load(#[from] LoadError),

    /// A catalog edit was rejected.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Checkout was refused.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Designer operation failed.
    #[error("Design error: {0}")]
    Design(#[from] DesignError),

    /// Environment configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Referenced product does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the user can fix this by changing their input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::BadRequest(_)
                | Self::Order(OrderError::EmptyCart | OrderError::Validation(_))
                | Self::Design(
                    DesignError::OutOfRange { .. }
                        | DesignError::NotFound(_)
                        | DesignError::InvalidColor(_)
                        | DesignError::UnknownOrnament(_)
                )
        )
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
