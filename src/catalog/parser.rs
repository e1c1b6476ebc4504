//! Channel catalog parser
//!
//! Walks the fixed `channels → sources → contents → streams → stream_links`
//! schema into typed records. Individual fields are read with optional-get
//! semantics: a missing or mistyped field falls back to an empty string, zero
//! or false instead of failing the whole document.

use serde_json::{Map, Value};
use tracing::debug;

use super::CatalogError;
use crate::models::{Channel, Content, Image, Label, RequestHeader, Source, Stream, StreamLink};

// JSON field names
const TAG_CHANNELS: &str = "channels";
const TAG_ID: &str = "id";
const TAG_NAME: &str = "name";
const TAG_SUBTITLE: &str = "subtitle";
const TAG_LABELS: &str = "labels";
const TAG_IMAGE: &str = "image";
const TAG_TYPE: &str = "type";
const TAG_DISPLAY: &str = "display";
const TAG_SOURCES: &str = "sources";
const TAG_CONTENTS: &str = "contents";
const TAG_STREAMS: &str = "streams";
const TAG_STREAM_LINKS: &str = "stream_links";
const TAG_URL: &str = "url";
const TAG_DEFAULT: &str = "default";
const TAG_REQUEST_HEADERS: &str = "request_headers";
const TAG_KEY: &str = "key";
const TAG_VALUE: &str = "value";
const TAG_POSITION: &str = "position";
const TAG_TEXT: &str = "text";
const TAG_COLOR: &str = "color";
const TAG_TEXT_COLOR: &str = "text_color";
const TAG_HEIGHT: &str = "height";
const TAG_WIDTH: &str = "width";
const TAG_SHAPE: &str = "shape";

type Object = Map<String, Value>;

/// Parse a catalog document held as text
pub fn parse_catalog_str(json: &str) -> Result<Vec<Channel>, CatalogError> {
    let root: Value = serde_json::from_str(json)?;
    parse_catalog(&root)
}

/// Parse a decoded catalog document.
///
/// Fails only when the root carries no `channels` array. Channels without a
/// single playable stream link are dropped.
pub fn parse_catalog(root: &Value) -> Result<Vec<Channel>, CatalogError> {
    let channels = root
        .get(TAG_CHANNELS)
        .and_then(Value::as_array)
        .ok_or(CatalogError::MissingChannels)?;

    let mut list = Vec::with_capacity(channels.len());
    for channel_json in channels.iter().filter_map(Value::as_object) {
        let channel = parse_channel(channel_json);
        if channel.has_valid_sources() {
            list.push(channel);
        } else {
            debug!(id = %channel.id, name = %channel.name, "Skipping channel without stream URL");
        }
    }
    Ok(list)
}

fn parse_channel(json: &Object) -> Channel {
    Channel {
        id: opt_string(json, TAG_ID),
        name: opt_string(json, TAG_NAME),
        subtitle: opt_string(json, TAG_SUBTITLE),
        kind: opt_string(json, TAG_TYPE),
        display: opt_string(json, TAG_DISPLAY),
        labels: opt_objects(json, TAG_LABELS).map(parse_label).collect(),
        image: json
            .get(TAG_IMAGE)
            .and_then(Value::as_object)
            .map(parse_image),
        sources: opt_objects(json, TAG_SOURCES).map(parse_source).collect(),
    }
}

fn parse_label(json: &Object) -> Label {
    Label {
        position: opt_string(json, TAG_POSITION),
        text: opt_string(json, TAG_TEXT),
        color: opt_string(json, TAG_COLOR),
        text_color: opt_string(json, TAG_TEXT_COLOR),
    }
}

fn parse_image(json: &Object) -> Image {
    Image {
        url: opt_string(json, TAG_URL),
        height: opt_int(json, TAG_HEIGHT),
        width: opt_int(json, TAG_WIDTH),
        display: opt_string(json, TAG_DISPLAY),
        shape: opt_string(json, TAG_SHAPE),
    }
}

fn parse_source(json: &Object) -> Source {
    Source {
        id: opt_string(json, TAG_ID),
        name: opt_string(json, TAG_NAME),
        contents: opt_objects(json, TAG_CONTENTS).map(parse_content).collect(),
    }
}

fn parse_content(json: &Object) -> Content {
    Content {
        id: opt_string(json, TAG_ID),
        name: opt_string(json, TAG_NAME),
        streams: opt_objects(json, TAG_STREAMS).map(parse_stream).collect(),
    }
}

fn parse_stream(json: &Object) -> Stream {
    Stream {
        id: opt_string(json, TAG_ID),
        name: opt_string(json, TAG_NAME),
        stream_links: opt_objects(json, TAG_STREAM_LINKS)
            .map(parse_stream_link)
            .collect(),
    }
}

fn parse_stream_link(json: &Object) -> StreamLink {
    StreamLink {
        id: opt_string(json, TAG_ID),
        name: opt_string(json, TAG_NAME),
        kind: opt_string(json, TAG_TYPE),
        is_default: opt_bool(json, TAG_DEFAULT),
        url: opt_string(json, TAG_URL),
        request_headers: opt_objects(json, TAG_REQUEST_HEADERS)
            .map(|header| RequestHeader {
                key: opt_string(header, TAG_KEY),
                value: opt_string(header, TAG_VALUE),
            })
            .collect(),
    }
}

// =============================================================================
// Optional-get helpers
// =============================================================================

/// Text form of a scalar; null, arrays and objects yield an empty string
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn opt_string(json: &Object, key: &str) -> String {
    json.get(key).map(scalar_to_string).unwrap_or_default()
}

fn opt_int(json: &Object, key: &str) -> i64 {
    match json.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        _ => 0,
    }
}

fn opt_bool(json: &Object, key: &str) -> bool {
    match json.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Object elements of an optional array field; anything else is skipped
fn opt_objects<'a>(json: &'a Object, key: &str) -> impl Iterator<Item = &'a Object> {
    json.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_channels_is_an_error() {
        assert!(matches!(
            parse_catalog(&json!({})),
            Err(CatalogError::MissingChannels)
        ));
        assert!(matches!(
            parse_catalog(&json!({ "channels": "nope" })),
            Err(CatalogError::MissingChannels)
        ));
        assert!(matches!(
            parse_catalog(&json!([1, 2])),
            Err(CatalogError::MissingChannels)
        ));
    }

    #[test]
    fn test_empty_channel_list() {
        let channels = parse_catalog(&json!({ "channels": [] })).unwrap();
        assert!(channels.is_empty());
    }

    #[test]
    fn test_mistyped_fields_default() {
        let doc = json!({
            "channels": [{
                "id": 42,
                "name": null,
                "labels": "not-an-array",
                "image": { "url": "http://img", "height": "720", "width": 1280.0 },
                "sources": [{ "contents": [{ "streams": [{ "stream_links": [
                    { "url": "http://a/live.m3u8", "default": "true", "request_headers": [7, { "key": "X-Token" }] }
                ]}]}]}]
            }]
        });
        let channels = parse_catalog(&doc).unwrap();
        assert_eq!(channels.len(), 1);

        let channel = &channels[0];
        assert_eq!(channel.id, "42");
        assert_eq!(channel.name, "");
        assert!(channel.labels.is_empty());

        let image = channel.image.as_ref().unwrap();
        assert_eq!(image.height, 720);
        assert_eq!(image.width, 1280);

        let link = channel.primary_stream_link().unwrap();
        assert!(link.is_default);
        assert_eq!(link.request_headers, vec![RequestHeader::new("X-Token", "")]);
    }

    #[test]
    fn test_non_object_channels_skipped() {
        let doc = json!({
            "channels": [
                "junk",
                { "id": "ok", "sources": [{ "contents": [{ "streams": [{ "stream_links": [{ "url": "http://a" }] }] }] }] }
            ]
        });
        let channels = parse_catalog(&doc).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "ok");
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_catalog_str("{ \"channels\": ["),
            Err(CatalogError::Json(_))
        ));
    }
}
