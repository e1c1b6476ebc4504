//! Catalog loading tests
//!
//! Tests remote/asset/file loading, the shared channel cache, lenient field
//! parsing, and background load cancellation.

use std::time::Duration;

use castreceiver::catalog::{
    parse_catalog_str, CatalogError, CatalogLocation, CatalogStore, ChannelListLoader,
};
use mockito::Server;
use tokio_test::{assert_err, assert_ok};

const CATALOG: &str = r#"{
    "channels": [
        {
            "id": "news",
            "name": "News",
            "subtitle": "Live headlines",
            "image": {"url": "http://img/news.png", "height": "360", "width": 640},
            "sources": [{
                "id": "s1",
                "name": "Network",
                "contents": [{
                    "id": "c1",
                    "streams": [{
                        "stream_links": [{
                            "type": "hls",
                            "default": "true",
                            "url": "http://cdn/news.m3u8",
                            "request_headers": [
                                {"key": "Referer", "value": "http://news/"}
                            ]
                        }]
                    }]
                }]
            }]
        },
        {
            "id": "empty",
            "name": "No streams",
            "sources": [{"contents": [{"streams": [{"stream_links": [{"url": ""}]}]}]}]
        },
        {
            "id": "movie",
            "name": "Feature",
            "sources": [{
                "name": "Studio",
                "contents": [{"streams": [{"stream_links": [
                    {"url": ""},
                    {"type": "mp4", "url": "http://cdn/feature.mp4"}
                ]}]}]
            }]
        }
    ]
}"#;

fn loader(store: &CatalogStore) -> ChannelListLoader {
    ChannelListLoader::new(store.clone(), "assets")
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_channels_without_stream_url_are_excluded() {
    let channels = parse_catalog_str(CATALOG).unwrap();
    let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["news", "movie"]);
}

#[test]
fn test_lenient_scalar_fields() {
    let channels = parse_catalog_str(CATALOG).unwrap();
    let news = &channels[0];

    let image = news.image.as_ref().unwrap();
    assert_eq!(image.height, 360);
    assert_eq!(image.width, 640);

    let link = news.primary_stream_link().unwrap();
    assert!(link.is_default);
    assert_eq!(link.kind, "hls");
    assert_eq!(link.request_headers[0].key, "Referer");
}

#[test]
fn test_primary_link_skips_empty_urls() {
    let channels = parse_catalog_str(CATALOG).unwrap();
    assert_eq!(channels[1].primary_video_url(), Some("http://cdn/feature.mp4"));
}

#[test]
fn test_malformed_branches_yield_empty_collections() {
    let json = r#"{"channels": [
        {"id": "a", "labels": "nope", "image": 3,
         "sources": [{"contents": {"bad": true}}, {"contents": [{"streams": [
            {"stream_links": [{"url": "http://a/1.mp4", "request_headers": "x"}]}
         ]}]}]},
        "not an object",
        42
    ]}"#;
    let channels = parse_catalog_str(json).unwrap();
    assert_eq!(channels.len(), 1);
    let channel = &channels[0];
    assert!(channel.labels.is_empty());
    assert!(channel.image.is_none());
    assert_eq!(channel.sources.len(), 2);
    assert!(channel.sources[0].contents.is_empty());
    assert!(channel.primary_stream_link().unwrap().request_headers.is_empty());
}

#[test]
fn test_missing_channels_key() {
    assert!(matches!(
        parse_catalog_str(r#"{"items": []}"#),
        Err(CatalogError::MissingChannels)
    ));
    assert!(matches!(parse_catalog_str("{not json"), Err(CatalogError::Json(_))));
}

// =============================================================================
// Remote Loading Tests
// =============================================================================

#[tokio::test]
async fn test_remote_load_is_cached() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/channels.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CATALOG)
        .expect(1)
        .create_async()
        .await;

    let store = CatalogStore::new();
    let loader = loader(&store);
    let url = format!("{}/channels.json", server.url());

    let first = assert_ok!(loader.load(&url).await);
    let second = assert_ok!(loader.load(&url).await);

    // Second load served from the cache
    mock.assert_async().await;
    assert_eq!(first.len(), 2);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_reload_clears_and_refetches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/channels.json")
        .with_status(200)
        .with_body(CATALOG)
        .expect(2)
        .create_async()
        .await;

    let store = CatalogStore::new();
    let loader = loader(&store);
    let url = format!("{}/channels.json", server.url());

    loader.load(&url).await.unwrap();
    let reloaded = loader.reload(&url).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reloaded.len(), 2);
}

#[tokio::test]
async fn test_http_error_leaves_store_untouched() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/channels.json")
        .with_status(503)
        .create_async()
        .await;

    let store = CatalogStore::new();
    let loader = loader(&store);
    let url = format!("{}/channels.json", server.url());

    let err = assert_err!(loader.load(&url).await);
    assert!(matches!(err, CatalogError::Http(503)));
    assert!(!store.is_loaded());
    assert!(loader.load_or_none(&url).await.is_none());
}

#[tokio::test]
async fn test_invalid_document_is_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/channels.json")
        .with_status(200)
        .with_body(r#"{"feeds": []}"#)
        .create_async()
        .await;

    let store = CatalogStore::new();
    let url = format!("{}/channels.json", server.url());
    assert!(matches!(
        loader(&store).load(&url).await,
        Err(CatalogError::MissingChannels)
    ));
}

#[tokio::test]
async fn test_concurrent_loaders_share_store() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/channels.json")
        .with_status(200)
        .with_body(CATALOG)
        .create_async()
        .await;

    let store = CatalogStore::new();
    let url = format!("{}/channels.json", server.url());
    let loaders: Vec<_> = (0..4).map(|_| loader(&store)).collect();

    let results = futures::future::join_all(loaders.iter().map(|l| l.load(&url))).await;
    for result in results {
        assert_eq!(result.unwrap().len(), 2);
    }
    assert_eq!(store.len(), 2);
    assert_eq!(store.find("movie").unwrap().name, "Feature");
}

// =============================================================================
// Asset and File Tests
// =============================================================================

#[tokio::test]
async fn test_asset_location_resolves_against_asset_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("channel.json"), CATALOG).unwrap();

    let store = CatalogStore::new();
    let loader = ChannelListLoader::new(store.clone(), dir.path());
    let channels = loader
        .load("file:///android_asset/channel.json")
        .await
        .unwrap();

    assert_eq!(channels.len(), 2);
    assert_eq!(store.channel_at(0).unwrap().id, "news");
}

#[tokio::test]
async fn test_missing_asset_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = CatalogStore::new();
    let loader = ChannelListLoader::new(store.clone(), dir.path());
    assert!(matches!(
        loader.load("file:///android_asset/absent.json").await,
        Err(CatalogError::Io(_))
    ));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_plain_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, CATALOG).unwrap();

    let store = CatalogStore::new();
    let channels = loader(&store).load(path.to_str().unwrap()).await.unwrap();
    assert_eq!(channels.len(), 2);
}

#[test]
fn test_location_parsing() {
    assert!(matches!(
        CatalogLocation::parse("https://example.com/c.json"),
        Ok(CatalogLocation::Remote(_))
    ));
    assert!(matches!(
        CatalogLocation::parse("file:///android_asset/channel.json"),
        Ok(CatalogLocation::Asset(_))
    ));
    assert!(CatalogLocation::parse("").is_err());
    assert!(CatalogLocation::parse("file:///android_asset/../etc/passwd").is_err());
}

// =============================================================================
// Background Load Tests
// =============================================================================

#[tokio::test]
async fn test_spawn_load_delivers_result() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("channel.json"), CATALOG).unwrap();

    let store = CatalogStore::new();
    let loader = ChannelListLoader::new(store.clone(), dir.path());
    let handle = loader.spawn_load("file:///android_asset/channel.json");

    let channels = handle.join().await.unwrap();
    assert_eq!(channels.len(), 2);
    assert!(store.is_loaded());
}

#[tokio::test]
async fn test_cancelled_load_delivers_nothing() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/slow.json")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_secs(2));
            w.write_all(CATALOG.as_bytes())
        })
        .create_async()
        .await;

    let store = CatalogStore::new();
    let handle = loader(&store).spawn_load(format!("{}/slow.json", server.url()));
    handle.cancel();

    assert!(matches!(handle.join().await, Err(CatalogError::Cancelled)));
    assert!(!store.is_loaded());
}
