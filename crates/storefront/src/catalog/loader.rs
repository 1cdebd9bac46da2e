//! Catalog and shop-config loading.
//!
//! Documents come from a static host over plain HTTP GET, or from a local
//! directory. Each load is a one-shot: there is no polling, no retry and no
//! timeout beyond what the HTTP client does by default.
//!
//! Failure policy:
//! - config failure: defaults, silently (logged at `warn`)
//! - products failure: empty catalog plus a [`LoadError`] for the surface to show
//! - a corrupt local override is ignored and the remote document is used

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Utc;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use super::{Catalog, CatalogError};
use crate::config::ShopConfig;
use crate::storage::{DeviceStorage, keys};

/// Products document name.
pub const PRODUCTS_DOCUMENT: &str = "products.json";

/// Shop config document name.
pub const CONFIG_DOCUMENT: &str = "config.json";

/// Errors that can occur while fetching a document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Transport-level HTTP failure.
    #[error("HTTP request for {document} failed: {source}")]
    Http {
        document: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Reading a local document failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building the document URL failed.
    #[error("invalid document URL: {0}")]
    Url(#[from] url::ParseError),

    /// The products document is unusable.
    #[error("invalid {document}: {source}")]
    Catalog {
        document: String,
        #[source]
        source: CatalogError,
    },
}

/// Where documents are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Static host; documents are resolved relative to this base.
    Http(Url),
    /// Local directory.
    Directory(PathBuf),
}

impl FromStr for DataSource {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            // Url::join drops the last path segment unless the base ends in '/'
            let base = if trimmed.ends_with('/') {
                trimmed.to_string()
            } else {
                format!("{trimmed}/")
            };
            return Ok(Self::Http(Url::parse(&base)?));
        }
        Ok(Self::Directory(PathBuf::from(trimmed)))
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::Directory(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Which catalog ended up in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    /// The shared products document.
    Remote,
    /// The admin override published to this device.
    Override,
}

/// Result of a full load. Never an error: failures degrade to defaults or an
/// empty catalog with `failure` set.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub config: ShopConfig,
    pub origin: CatalogOrigin,
    pub failure: Option<LoadError>,
}

/// Fetches the products and config documents.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    source: DataSource,
    client: reqwest::Client,
}

impl CatalogLoader {
    /// Create a loader with a default HTTP client.
    #[must_use]
    pub fn new(source: DataSource) -> Self {
        Self::with_client(source, reqwest::Client::new())
    }

    /// Create a loader sharing an existing HTTP client.
    #[must_use]
    pub const fn with_client(source: DataSource, client: reqwest::Client) -> Self {
        Self { source, client }
    }

    /// The configured source.
    #[must_use]
    pub const fn source(&self) -> &DataSource {
        &self.source
    }

    /// Load config and catalog, preferring a published override.
    #[instrument(skip(self, storage), fields(source = %self.source))]
    pub async fn load(&self, storage: &dyn DeviceStorage) -> LoadedCatalog {
        let config = self.load_config().await;

        if let Some(catalog) = read_override(storage) {
            tracing::info!(products = catalog.len(), "using local catalog override");
            return LoadedCatalog {
                catalog,
                config,
                origin: CatalogOrigin::Override,
                failure: None,
            };
        }

        match self.load_products().await {
            Ok(catalog) => {
                tracing::info!(products = catalog.len(), "catalog loaded");
                LoadedCatalog {
                    catalog,
                    config,
                    origin: CatalogOrigin::Remote,
                    failure: None,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load catalog");
                LoadedCatalog {
                    catalog: Catalog::new(),
                    config,
                    origin: CatalogOrigin::Remote,
                    failure: Some(e),
                }
            }
        }
    }

    /// Load the shop config, falling back to defaults on any failure.
    pub async fn load_config(&self) -> ShopConfig {
        match self.fetch_text(CONFIG_DOCUMENT).await {
            Ok(text) => ShopConfig::from_json_or_default(&text),
            Err(e) => {
                tracing::warn!(error = %e, "shop config unavailable, using defaults");
                ShopConfig::default()
            }
        }
    }

    /// Load the shared products document, ignoring any override.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the document cannot be fetched or is not a
    /// JSON array.
    pub async fn load_products(&self) -> Result<Catalog, LoadError> {
        let text = self.fetch_text(PRODUCTS_DOCUMENT).await?;
        Catalog::parse(&text).map_err(|source| LoadError::Catalog {
            document: PRODUCTS_DOCUMENT.to_string(),
            source,
        })
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_text(&self, document: &str) -> Result<String, LoadError> {
        match &self.source {
            DataSource::Http(base) => {
                let url = cache_busted(base, document)?;
                let response = self
                    .client
                    .get(url.clone())
                    .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
                    .send()
                    .await
                    .map_err(|source| LoadError::Http {
                        document: document.to_string(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                response.text().await.map_err(|source| LoadError::Http {
                    document: document.to_string(),
                    source,
                })
            }
            DataSource::Directory(dir) => {
                let path = dir.join(document);
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| LoadError::Io { path, source })
            }
        }
    }
}

/// Resolve a document against the base URL and append a `v=<millis>`
/// query parameter so intermediaries never serve a stale copy.
fn cache_busted(base: &Url, document: &str) -> Result<Url, url::ParseError> {
    let mut url = base.join(document)?;
    url.query_pairs_mut()
        .append_pair("v", &Utc::now().timestamp_millis().to_string());
    Ok(url)
}

/// Read the published override, if there is a usable one.
#[must_use]
pub fn read_override(storage: &dyn DeviceStorage) -> Option<Catalog> {
    let raw = match storage.get(keys::PRODUCTS_OVERRIDE) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read catalog override, using remote");
            return None;
        }
    };

    match Catalog::parse(&raw) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            tracing::warn!(error = %e, "local catalog override is invalid, using remote");
            None
        }
    }
}
