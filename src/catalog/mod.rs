//! Channel catalog
//!
//! - Parser: lenient decoding of the catalog JSON into channel records
//! - Store: owned cache of the last parsed catalog
//! - Loader: resolves a catalog location, fetches and parses it

pub mod loader;
pub mod parser;
pub mod store;

use thiserror::Error;

pub use loader::{CatalogLocation, ChannelListLoader, LoadHandle};
pub use parser::{parse_catalog, parse_catalog_str};
pub use store::CatalogStore;

/// Catalog loading error types
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid catalog location: {0:?}")]
    InvalidLocation(String),

    #[error("Catalog document has no channel list")]
    MissingChannels,

    #[error("Catalog server returned HTTP {0}")]
    Http(u16),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog load was cancelled")]
    Cancelled,
}
