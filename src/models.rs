//! Data structures for the channel catalog
//!
//! Contains the shared models used across the receiver, organized by domain:
//! - **Catalog**: the nested Channel → Source → Content → Stream → StreamLink tree
//! - **Display**: labels and images attached to a channel
//! - **Legacy**: the flat Movie record older playback code still consumes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Catalog Models
// =============================================================================

/// A playable catalog entry that may offer multiple distribution sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub subtitle: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub display: String,
    pub labels: Vec<Label>,
    pub image: Option<Image>,
    pub sources: Vec<Source>,
}

impl Channel {
    /// Iterate every stream link in depth-first document order
    pub fn stream_links(&self) -> impl Iterator<Item = &StreamLink> {
        self.sources
            .iter()
            .flat_map(|source| source.contents.iter())
            .flat_map(|content| content.streams.iter())
            .flat_map(|stream| stream.stream_links.iter())
    }

    /// True when at least one stream link anywhere in the tree has a URL
    pub fn has_valid_sources(&self) -> bool {
        self.stream_links().any(StreamLink::has_url)
    }

    /// First stream link with a non-empty URL (depth-first)
    pub fn primary_stream_link(&self) -> Option<&StreamLink> {
        self.stream_links().find(|link| link.has_url())
    }

    /// URL of the primary stream link
    pub fn primary_video_url(&self) -> Option<&str> {
        self.primary_stream_link().map(|link| link.url.as_str())
    }

    pub fn display_title(&self) -> &str {
        &self.name
    }

    pub fn display_description(&self) -> &str {
        &self.subtitle
    }

    /// Channel artwork URL, if the channel carries a non-empty one
    pub fn image_url(&self) -> Option<&str> {
        self.image
            .as_ref()
            .map(|image| image.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subtitle.is_empty() {
            write!(f, "{} [{}]", self.name, self.id)
        } else {
            write!(f, "{} - {} [{}]", self.name, self.subtitle, self.id)
        }
    }
}

/// A distribution source offering one or more contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    pub id: String,
    pub name: String,
    pub streams: Vec<Stream>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    pub id: String,
    pub name: String,
    pub stream_links: Vec<StreamLink>,
}

/// Resolved playable URL plus the HTTP headers needed to fetch it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamLink {
    pub id: String,
    pub name: String,
    /// Stream format hint, e.g. "hls", "dash", "mp4"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "default")]
    pub is_default: bool,
    pub url: String,
    pub request_headers: Vec<RequestHeader>,
}

impl StreamLink {
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Request headers as a map, in key order.
    ///
    /// Headers with an empty key are skipped. Keys compare case-insensitively
    /// and a later duplicate wins, keeping its spelling.
    pub fn header_map(&self) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for header in self.request_headers.iter().filter(|h| !h.key.is_empty()) {
            headers.retain(|key, _| !key.eq_ignore_ascii_case(&header.key));
            headers.insert(header.key.clone(), header.value.clone());
        }
        headers
    }
}

impl fmt::Display for StreamLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.kind.is_empty() { "?" } else { &self.kind };
        write!(f, "[{}] {}", kind, self.url)?;
        if !self.request_headers.is_empty() {
            write!(f, " (+{} headers)", self.request_headers.len())?;
        }
        Ok(())
    }
}

/// HTTP header sent when fetching a stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestHeader {
    pub key: String,
    pub value: String,
}

impl RequestHeader {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Display Models
// =============================================================================

/// Badge drawn over a channel card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub position: String,
    pub text: String,
    pub color: String,
    pub text_color: String,
}

/// Channel artwork
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub url: String,
    pub height: i64,
    pub width: i64,
    pub display: String,
    pub shape: String,
}

// =============================================================================
// Legacy Models
// =============================================================================

/// Flat media record kept for older playback code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub id: usize,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub card_image_url: String,
    pub background_image_url: String,
    pub studio: String,
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.title)?;
        if !self.studio.is_empty() {
            write!(f, " ({})", self.studio)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str) -> StreamLink {
        StreamLink {
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn channel_with(links: Vec<Vec<StreamLink>>) -> Channel {
        Channel {
            id: "c1".into(),
            name: "News".into(),
            sources: vec![Source {
                name: "Provider".into(),
                contents: vec![Content {
                    streams: links
                        .into_iter()
                        .map(|stream_links| Stream {
                            stream_links,
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_stream_link_skips_empty_urls() {
        let channel = channel_with(vec![vec![link("")], vec![link("http://a/1"), link("http://a/2")]]);
        assert_eq!(channel.primary_video_url(), Some("http://a/1"));
        assert!(channel.has_valid_sources());
    }

    #[test]
    fn test_channel_without_urls_is_invalid() {
        let channel = channel_with(vec![vec![link("")], vec![]]);
        assert!(!channel.has_valid_sources());
        assert!(channel.primary_stream_link().is_none());
        assert!(!Channel::default().has_valid_sources());
    }

    #[test]
    fn test_image_url_ignores_empty() {
        let mut channel = Channel::default();
        assert_eq!(channel.image_url(), None);
        channel.image = Some(Image::default());
        assert_eq!(channel.image_url(), None);
        channel.image = Some(Image {
            url: "http://img/1.png".into(),
            ..Default::default()
        });
        assert_eq!(channel.image_url(), Some("http://img/1.png"));
    }

    #[test]
    fn test_header_map_last_duplicate_wins() {
        let stream_link = StreamLink {
            request_headers: vec![
                RequestHeader::new("Referer", "http://one"),
                RequestHeader::new("", "dropped"),
                RequestHeader::new("Referer", "http://two"),
                RequestHeader::new("User-Agent", "Receiver/1.0"),
            ],
            ..link("http://a/1")
        };
        let headers = stream_link.header_map();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Referer"], "http://two");
        assert_eq!(headers["User-Agent"], "Receiver/1.0");
    }

    #[test]
    fn test_header_map_keys_ignore_case() {
        let stream_link = StreamLink {
            request_headers: vec![
                RequestHeader::new("Referer", "http://one"),
                RequestHeader::new("user-agent", "Old/1.0"),
                RequestHeader::new("referer", "http://two"),
                RequestHeader::new("User-Agent", "New/2.0"),
            ],
            ..link("http://a/1")
        };
        let headers = stream_link.header_map();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["referer"], "http://two");
        assert_eq!(headers["User-Agent"], "New/2.0");
        assert!(!headers.contains_key("Referer"));
    }

    #[test]
    fn test_display() {
        let channel = Channel {
            id: "c1".into(),
            name: "News".into(),
            subtitle: "24/7".into(),
            ..Default::default()
        };
        assert_eq!(channel.to_string(), "News - 24/7 [c1]");
        let movie = Movie {
            id: 3,
            title: "News".into(),
            studio: "Provider".into(),
            ..Default::default()
        };
        assert_eq!(movie.to_string(), "#3 News (Provider)");
    }
}
