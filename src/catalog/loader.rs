//! Channel list loader
//!
//! Resolves a catalog location (remote URL, bundled asset or local file),
//! fetches the document and parses it into the shared [`CatalogStore`].

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{parser, CatalogError, CatalogStore};
use crate::models::Channel;

/// URL prefix addressing files bundled with the receiver
pub const ASSET_URL_PREFIX: &str = "file:///android_asset/";

const FILE_URL_PREFIX: &str = "file://";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a catalog document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLocation {
    /// HTTP(S) URL fetched with GET
    Remote(String),
    /// Path relative to the asset directory
    Asset(PathBuf),
    /// Local file path
    File(PathBuf),
}

impl CatalogLocation {
    /// Classify a location string
    pub fn parse(location: &str) -> Result<Self, CatalogError> {
        let location = location.trim();
        let invalid = || CatalogError::InvalidLocation(location.to_string());

        if location.is_empty() {
            return Err(invalid());
        }

        if let Some(asset) = location.strip_prefix(ASSET_URL_PREFIX) {
            let path = PathBuf::from(decode_path(asset));
            let escapes = path
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if asset.is_empty() || escapes {
                return Err(invalid());
            }
            return Ok(CatalogLocation::Asset(path));
        }

        if let Some(path) = location.strip_prefix(FILE_URL_PREFIX) {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(CatalogLocation::File(PathBuf::from(decode_path(path))));
        }

        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(CatalogLocation::Remote(location.to_string()));
        }

        if location.contains("://") {
            return Err(invalid());
        }

        Ok(CatalogLocation::File(PathBuf::from(location)))
    }
}

impl fmt::Display for CatalogLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogLocation::Remote(url) => write!(f, "{}", url),
            CatalogLocation::Asset(path) => write!(f, "{}{}", ASSET_URL_PREFIX, path.display()),
            CatalogLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn decode_path(path: &str) -> String {
    urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Loads channel catalogs into a shared store
#[derive(Clone)]
pub struct ChannelListLoader {
    store: CatalogStore,
    asset_dir: PathBuf,
    client: reqwest::Client,
}

impl ChannelListLoader {
    /// Create a loader with the default request timeout
    pub fn new(store: CatalogStore, asset_dir: impl Into<PathBuf>) -> Self {
        Self::with_timeout(store, asset_dir, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        store: CatalogStore,
        asset_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self::with_client(
            store,
            asset_dir,
            reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        )
    }

    /// Create a loader around an existing HTTP client
    pub fn with_client(
        store: CatalogStore,
        asset_dir: impl Into<PathBuf>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            store,
            asset_dir: asset_dir.into(),
            client,
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Fetch and decode the catalog document without parsing channels
    pub async fn fetch_document(&self, location: &CatalogLocation) -> Result<Value, CatalogError> {
        let text = match location {
            CatalogLocation::Remote(url) => {
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(CatalogError::Http(status.as_u16()));
                }
                response.text().await?
            }
            CatalogLocation::Asset(path) => {
                tokio::fs::read_to_string(self.asset_dir.join(path)).await?
            }
            CatalogLocation::File(path) => tokio::fs::read_to_string(path).await?,
        };

        Ok(serde_json::from_str(&text)?)
    }

    /// Load the catalog, reusing the cached list when one exists.
    ///
    /// A failed load leaves the store untouched.
    pub async fn load(&self, location: &str) -> Result<Arc<Vec<Channel>>, CatalogError> {
        if let Some(cached) = self.store.get() {
            debug!(count = cached.len(), "Using cached channel list");
            return Ok(cached);
        }

        let location = CatalogLocation::parse(location)?;
        debug!("Loading channels from {}", location);

        let document = self.fetch_document(&location).await?;
        let channels = parser::parse_catalog(&document)?;
        info!(count = channels.len(), "Loaded channels from {}", location);

        Ok(self.store.replace(channels))
    }

    /// Clear the cache, then load from source
    pub async fn reload(&self, location: &str) -> Result<Arc<Vec<Channel>>, CatalogError> {
        self.store.clear();
        self.load(location).await
    }

    /// Load the catalog, logging failures instead of returning them
    pub async fn load_or_none(&self, location: &str) -> Option<Arc<Vec<Channel>>> {
        match self.load(location).await {
            Ok(channels) => Some(channels),
            Err(e) => {
                error!("Failed to fetch channel data from {}: {}", location, e);
                None
            }
        }
    }

    /// Run a one-shot load on a background task
    pub fn spawn_load(&self, location: impl Into<String>) -> LoadHandle {
        let loader = self.clone();
        let location = location.into();
        debug!("Starting to load channels from {}", location);
        LoadHandle {
            handle: tokio::spawn(async move { loader.load(&location).await }),
        }
    }
}

/// Handle to a background catalog load
pub struct LoadHandle {
    handle: JoinHandle<Result<Arc<Vec<Channel>>, CatalogError>>,
}

impl LoadHandle {
    /// Stop the load; the in-flight read is dropped and no result is delivered
    pub fn cancel(&self) {
        debug!("Stopping channel load");
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the load result
    pub async fn join(self) -> Result<Arc<Vec<Channel>>, CatalogError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(CatalogError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}
