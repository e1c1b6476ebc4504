//! castreceiver - channel catalog player and Cast media receiver
//!
//! Loads a JSON channel catalog, plays channels with the HTTP request headers
//! their streams require, and turns Cast `LOAD` requests into playback.
//!
//! # Modules
//!
//! - `models` - Channel catalog schema and the legacy Movie record
//! - `catalog` - Catalog parsing, loading and the shared channel cache
//! - `adapter` - Channel → Movie conversion
//! - `playback` - Source selection, players and the playback controller
//! - `cast` - Cast load handling and message transport
//! - `config` - Config file and environment settings
//! - `cli` / `commands` - Command line surface

pub mod adapter;
pub mod cast;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod playback;

// Re-export commonly used types
pub use models::{
    Channel, Content, Image, Label, Movie, RequestHeader, Source, Stream, StreamLink,
};

pub use adapter::{channel_to_movie, channels_to_movies, MovieListLoader};
pub use cast::{CastReceiver, MediaError, MediaInfo, MediaLoadRequest};
pub use catalog::{CatalogError, CatalogStore, ChannelListLoader};
pub use playback::{
    LocalPlayer, MediaSource, MediaSourceKind, PlaybackController, PlaybackError, PlayerBackend,
    PlayerType,
};
