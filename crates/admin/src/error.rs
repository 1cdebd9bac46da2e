//! Admin error types.

use acchiappasogni_storefront::catalog::CatalogError;
use acchiappasogni_storefront::storage::StorageError;
use thiserror::Error;

/// Errors from the PIN gate and the override editor.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The editor was opened while the gate is locked.
    #[error("admin panel is locked")]
    Locked,

    /// The PIN did not match.
    #[error("wrong PIN")]
    WrongPin,

    /// A new PIN does not meet the format rules.
    #[error("invalid PIN: {0}")]
    WeakPin(String),

    /// Argon2 failed to hash the PIN.
    #[error("PIN hashing error")]
    PinHash,

    /// Products need a non-blank title.
    #[error("title is required")]
    MissingTitle,

    /// Uploaded photo exceeds the size limit.
    #[error("image is {size} bytes, the limit is {max}")]
    ImageTooLarge { size: usize, max: usize },

    /// Uploaded file is not an image.
    #[error("unsupported image type {0:?}")]
    UnsupportedImageType(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Exported JSON could not be produced.
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),
}

impl AdminError {
    /// Whether the operator can fix this by changing their input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::PinHash | Self::Storage(_) | Self::Export(_))
    }
}
