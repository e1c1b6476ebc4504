//! Cast media payloads
//!
//! Wire types carried by Cast `LOAD` requests and the translations between
//! them and the catalog models: MediaInfo → synthetic Channel (with request
//! headers from custom data), load request → Movie, and entity → MediaInfo.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter;
use crate::catalog::parser::scalar_to_string;
use crate::catalog::CatalogStore;
use crate::models::{Channel, Content, Image, Movie, RequestHeader, Source, Stream, StreamLink};

/// Key in `customData` holding the request headers object
pub const CUSTOM_DATA_HEADERS: &str = "headers";

pub const DEFAULT_CAST_TITLE: &str = "Cast Video";
pub const CAST_SOURCE_NAME: &str = "Cast Source";
pub const CAST_CONTENT_ID: &str = "cast-content";

/// Cast metadata type for movies
pub const METADATA_TYPE_MOVIE: i32 = 1;

/// Cast `LOAD` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaLoadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    /// Start position in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Value>,
}

/// Cast media description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaInfo {
    pub content_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CastMediaMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Value>,
}

impl MediaInfo {
    /// The `customData.headers` value, when present
    pub fn custom_headers(&self) -> Option<&Value> {
        self.custom_data.as_ref()?.get(CUSTOM_DATA_HEADERS)
    }

    pub fn has_custom_headers(&self) -> bool {
        self.custom_headers().is_some()
    }

    /// Request headers carried in `customData.headers`.
    ///
    /// Strings are kept verbatim and other scalars rendered as text; nested
    /// values are skipped. A non-object `headers` yields no headers.
    pub fn request_headers(&self) -> Vec<RequestHeader> {
        let Some(headers) = self.custom_headers() else {
            return Vec::new();
        };
        let Some(headers) = headers.as_object() else {
            warn!("Error extracting headers from Cast custom data: headers is not an object");
            return Vec::new();
        };

        headers
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Array(_) | Value::Object(_) | Value::Null => {
                    warn!(header = %key, "Skipping non-scalar Cast header value");
                    None
                }
                _ => {
                    let value = scalar_to_string(value);
                    debug!("Extracted header from Cast: {} = {}", key, value);
                    Some(RequestHeader::new(key.clone(), value))
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CastMediaMetadata {
    pub metadata_type: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    pub images: Vec<WebImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl WebImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Stream link type for a Cast content type (unknown types are treated as HLS)
pub fn stream_type_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "application/x-mpegURL" => "hls",
        "application/dash+xml" => "dash",
        "video/mp4" => "mp4",
        _ => "hls",
    }
}

/// Build a single-link channel from Cast media, carrying custom-data headers
pub fn media_info_to_channel(media: &MediaInfo) -> Channel {
    let metadata = media.metadata.as_ref();
    let name = metadata
        .and_then(|m| m.title.clone())
        .unwrap_or_else(|| DEFAULT_CAST_TITLE.to_string());
    let subtitle = metadata.and_then(|m| m.subtitle.clone()).unwrap_or_default();
    let image = metadata
        .and_then(|m| m.images.first())
        .map(|image| Image {
            url: image.url.clone(),
            ..Default::default()
        });

    let stream_link = StreamLink {
        kind: stream_type_for_content_type(&media.content_type).to_string(),
        url: media.content_id.clone(),
        request_headers: media.request_headers(),
        ..Default::default()
    };

    let content = Content {
        id: CAST_CONTENT_ID.to_string(),
        name: name.clone(),
        streams: vec![Stream {
            stream_links: vec![stream_link],
            ..Default::default()
        }],
    };

    let channel = Channel {
        name,
        subtitle,
        image,
        sources: vec![Source {
            name: CAST_SOURCE_NAME.to_string(),
            contents: vec![content],
            ..Default::default()
        }],
        ..Default::default()
    };

    debug!(
        "Created channel from MediaInfo: {}, headers: {}",
        channel.name,
        channel
            .primary_stream_link()
            .map(|link| link.request_headers.len())
            .unwrap_or(0)
    );
    channel
}

/// Flatten a load request into a Movie; `None` without media
pub fn load_request_to_movie(request: &MediaLoadRequest) -> Option<Movie> {
    let media = request.media.as_ref()?;
    let mut movie = Movie {
        video_url: media
            .content_url
            .clone()
            .unwrap_or_else(|| media.content_id.clone()),
        ..Default::default()
    };

    if let Some(metadata) = &media.metadata {
        movie.title = metadata.title.clone().unwrap_or_default();
        movie.description = metadata.subtitle.clone().unwrap_or_default();
        if let Some(image) = metadata.images.first() {
            movie.card_image_url = image.url.clone();
        }
    }
    Some(movie)
}

/// Resolve a load-by-entity request against the catalog.
///
/// When the media has no content URL but names an entity matching a catalog
/// channel id, sets the content URL and a movie metadata block. Returns true
/// if the media info was filled.
pub fn fill_media_info(media: &mut MediaInfo, store: &CatalogStore) -> bool {
    debug!("***Type:{}", media.content_type);
    if media.content_url.is_some() {
        return false;
    }
    let Some(entity) = media.entity.as_deref() else {
        return false;
    };
    let Some(movie) = entity_to_movie(entity, store) else {
        debug!(entity, "Entity not found in catalog");
        return false;
    };
    if movie.video_url.is_empty() {
        return false;
    }

    let images = [&movie.card_image_url, &movie.background_image_url]
        .into_iter()
        .filter(|url| !url.is_empty())
        .map(|url| WebImage::new(url.clone()))
        .collect();
    let optional = |s: &String| Some(s.clone()).filter(|s| !s.is_empty());

    media.metadata = Some(CastMediaMetadata {
        metadata_type: METADATA_TYPE_MOVIE,
        title: optional(&movie.title),
        subtitle: optional(&movie.description),
        studio: optional(&movie.studio),
        images,
    });
    media.content_url = Some(movie.video_url);
    true
}

/// Entity strings are channel ids, optionally as the last segment of a URI
fn entity_to_movie(entity: &str, store: &CatalogStore) -> Option<Movie> {
    let id = if entity.contains("://") {
        entity.trim_end_matches('/').rsplit('/').next()?
    } else {
        entity
    };

    let channels = store.get()?;
    channels
        .iter()
        .enumerate()
        .find(|(_, channel)| channel.id == id)
        .map(|(index, channel)| adapter::channel_to_movie(channel, index))
}
