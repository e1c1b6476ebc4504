//! Media sources
//!
//! Builds what the player consumes from catalog records: the URL, display
//! metadata, the HTTP data source carrying per-stream request headers, and
//! the segmented (HLS) vs progressive routing decision.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tracing::debug;

use super::PlaybackError;
use crate::models::{Channel, Movie, StreamLink};

/// File extension of an HLS manifest
pub const HLS_MANIFEST_EXTENSION: &str = ".m3u8";

/// Stream type value that marks a link as HLS
pub const HLS_STREAM_TYPE: &str = "hls";

/// How the player should read a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSourceKind {
    /// Segmented stream driven by an HLS manifest
    Hls,
    /// Single progressive download (mp4, mkv, ...)
    Progressive,
}

impl MediaSourceKind {
    /// Route a stream link: HLS by declared type or manifest URL
    pub fn for_stream_link(link: &StreamLink) -> Self {
        if link.kind.eq_ignore_ascii_case(HLS_STREAM_TYPE) {
            MediaSourceKind::Hls
        } else {
            Self::for_url(&link.url)
        }
    }

    /// Route a bare URL by its path extension (query and fragment ignored)
    pub fn for_url(url: &str) -> Self {
        let pattern = format!(r"(?i){}(?:[?#]|$)", regex::escape(HLS_MANIFEST_EXTENSION));
        let re = regex::Regex::new(&pattern).ok();
        match re {
            Some(re) if re.is_match(url) => MediaSourceKind::Hls,
            _ => MediaSourceKind::Progressive,
        }
    }
}

impl fmt::Display for MediaSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSourceKind::Hls => write!(f, "HLS"),
            MediaSourceKind::Progressive => write!(f, "Progressive"),
        }
    }
}

// =============================================================================
// HTTP Data Source
// =============================================================================

/// HTTP data source with default request properties sent on every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpDataSource {
    request_properties: BTreeMap<String, String>,
}

impl HttpDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data source carrying a stream link's request headers
    pub fn for_stream_link(link: &StreamLink) -> Self {
        let mut source = Self::new();
        let headers = link.header_map();
        if !headers.is_empty() {
            debug!(?headers, "Added headers");
            source.set_default_request_properties(headers);
        }
        source
    }

    pub fn set_default_request_properties(&mut self, properties: BTreeMap<String, String>) {
        self.request_properties = properties;
    }

    pub fn request_properties(&self) -> &BTreeMap<String, String> {
        &self.request_properties
    }

    pub fn has_headers(&self) -> bool {
        !self.request_properties.is_empty()
    }

    /// Request properties as HTTP headers
    pub fn header_map(&self) -> Result<HeaderMap, PlaybackError> {
        let mut headers = HeaderMap::with_capacity(self.request_properties.len());
        for (key, value) in &self.request_properties {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| PlaybackError::InvalidHeader(key.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| PlaybackError::InvalidHeader(key.clone()))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// HTTP client that sends the request properties by default
    pub fn build_client(&self) -> Result<reqwest::Client, PlaybackError> {
        Ok(reqwest::Client::builder()
            .default_headers(self.header_map()?)
            .build()?)
    }

    /// Open a URL through this data source
    pub async fn open(&self, url: &str) -> Result<reqwest::Response, PlaybackError> {
        let response = self.build_client()?.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlaybackError::Http(status.as_u16()));
        }
        Ok(response)
    }
}

// =============================================================================
// Media Items
// =============================================================================

/// Display metadata surfaced to the player and the session controls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaMetadata {
    pub title: String,
    pub subtitle: String,
    pub artwork_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub uri: String,
    pub metadata: MediaMetadata,
}

/// Playable source: routing kind, item and the data source to read it with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSource {
    pub kind: MediaSourceKind,
    pub item: MediaItem,
    pub data_source: HttpDataSource,
}

impl MediaSource {
    /// Source for a stream link, carrying its request headers
    pub fn from_stream_link(link: &StreamLink, metadata: MediaMetadata) -> Self {
        Self {
            kind: MediaSourceKind::for_stream_link(link),
            item: MediaItem {
                uri: link.url.clone(),
                metadata,
            },
            data_source: HttpDataSource::for_stream_link(link),
        }
    }

    /// Source for a channel's primary stream link
    pub fn from_channel(channel: &Channel) -> Result<Self, PlaybackError> {
        let link = channel
            .primary_stream_link()
            .ok_or(PlaybackError::NoStreamUrl)?;

        let metadata = MediaMetadata {
            title: channel.display_title().to_string(),
            subtitle: channel.display_description().to_string(),
            artwork_uri: channel.image_url().map(str::to_string),
        };
        Ok(Self::from_stream_link(link, metadata))
    }

    /// Source for a legacy movie record (no request headers)
    pub fn from_movie(movie: &Movie) -> Result<Self, PlaybackError> {
        if movie.video_url.is_empty() {
            return Err(PlaybackError::NoStreamUrl);
        }

        Ok(Self {
            kind: MediaSourceKind::for_url(&movie.video_url),
            item: MediaItem {
                uri: movie.video_url.clone(),
                metadata: MediaMetadata {
                    title: movie.title.clone(),
                    subtitle: movie.description.clone(),
                    artwork_uri: Some(movie.card_image_url.clone()).filter(|u| !u.is_empty()),
                },
            },
            data_source: HttpDataSource::new(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.item.uri
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        self.data_source.request_properties()
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.item.uri)
    }
}
