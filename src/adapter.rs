//! Channel → Movie adapter
//!
//! Keeps the flat legacy Movie shape working alongside the nested channel
//! schema.

use tracing::{debug, error, info};

use crate::catalog::{CatalogError, ChannelListLoader};
use crate::models::{Channel, Movie};

/// Studio label used when a channel has no source
pub const UNKNOWN_STUDIO: &str = "Unknown";

/// Flatten a channel into a Movie
pub fn channel_to_movie(channel: &Channel, id: usize) -> Movie {
    let image_url = channel.image_url().unwrap_or_default().to_string();

    Movie {
        id,
        title: channel.display_title().to_string(),
        description: channel.display_description().to_string(),
        video_url: channel.primary_video_url().unwrap_or_default().to_string(),
        card_image_url: image_url.clone(),
        background_image_url: image_url,
        studio: channel
            .sources
            .first()
            .map(|source| source.name.clone())
            .unwrap_or_else(|| UNKNOWN_STUDIO.to_string()),
    }
}

/// Flatten a channel list; movie ids are list positions
pub fn channels_to_movies(channels: &[Channel]) -> Vec<Movie> {
    channels
        .iter()
        .enumerate()
        .map(|(index, channel)| channel_to_movie(channel, index))
        .collect()
}

/// Loads the channel catalog and presents it as movies
#[derive(Clone)]
pub struct MovieListLoader {
    loader: ChannelListLoader,
}

impl MovieListLoader {
    pub fn new(loader: ChannelListLoader) -> Self {
        Self { loader }
    }

    pub fn channel_loader(&self) -> &ChannelListLoader {
        &self.loader
    }

    /// Fresh load: clears the cached catalog, loads and converts
    pub async fn try_load_movies(&self, location: &str) -> Result<Vec<Movie>, CatalogError> {
        debug!("Loading channels from {} and converting to movies", location);
        let channels = self.loader.reload(location).await?;
        let movies = channels_to_movies(&channels);
        info!(
            movies = movies.len(),
            channels = self.loader.store().len(),
            "Loaded and converted movies from channels"
        );
        Ok(movies)
    }

    /// Like [`try_load_movies`](Self::try_load_movies), logging failures
    pub async fn load_movies(&self, location: &str) -> Option<Vec<Movie>> {
        match self.try_load_movies(location).await {
            Ok(movies) => Some(movies),
            Err(e) => {
                error!("Failed to fetch and convert channel data to movies: {}", e);
                None
            }
        }
    }

    /// Movies for whatever the store currently holds
    pub fn movies_from_store(&self) -> Option<Vec<Movie>> {
        self.loader
            .store()
            .get()
            .map(|channels| channels_to_movies(&channels))
    }
}
