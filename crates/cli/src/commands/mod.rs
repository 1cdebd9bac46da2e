//! Subcommand implementations.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod design;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use acchiappasogni_storefront::catalog::{CatalogLoader, DataSource};
use acchiappasogni_storefront::config::StorefrontConfig;
use acchiappasogni_storefront::error::AppError;
use acchiappasogni_storefront::state::Storefront;
use acchiappasogni_storefront::storage::{FileStorage, SharedStorage};

/// Resolved data source and device storage for one invocation.
pub struct Context {
    pub loader: CatalogLoader,
    pub storage: SharedStorage,
}

impl Context {
    /// Combine command-line flags with environment defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not a valid URL or the storage
    /// directory cannot be created.
    pub fn new(source: Option<&str>, storage_dir: Option<PathBuf>) -> Result<Self, AppError> {
        let config = StorefrontConfig::from_env()?;

        let data_source = match source {
            Some(s) => s
                .parse::<DataSource>()
                .map_err(|e| AppError::BadRequest(format!("invalid --source {s:?}: {e}")))?,
            None => config.data_source,
        };
        let storage_dir = storage_dir.unwrap_or(config.storage_dir);

        tracing::debug!(source = %data_source, storage = %storage_dir.display(), "context resolved");

        Ok(Self {
            loader: CatalogLoader::new(data_source),
            storage: Arc::new(FileStorage::open(storage_dir)?),
        })
    }

    /// Load the storefront session.
    pub async fn storefront(&self) -> Storefront {
        Storefront::open(&self.loader, SharedStorage::clone(&self.storage)).await
    }
}

/// Write one line of command output to stdout.
///
/// # Errors
///
/// Returns an error if stdout is closed.
pub fn out(line: impl std::fmt::Display) -> io::Result<()> {
    writeln!(io::stdout().lock(), "{line}")
}
