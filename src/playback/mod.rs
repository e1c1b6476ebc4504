//! Playback selection
//!
//! - Source: media source routing and the header-carrying HTTP data source
//! - Player: player backend seam and the VLC/mpv implementation
//!
//! [`PlaybackController`] owns the single active player session.

pub mod player;
pub mod source;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::models::{Channel, Movie};

pub use player::{LocalPlayer, PlayerBackend, PlayerError, PlayerType};
pub use source::{HttpDataSource, MediaItem, MediaMetadata, MediaSource, MediaSourceKind};

/// Playback error types
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Channel is null")]
    NullChannel,

    #[error("No valid stream URL found")]
    NoStreamUrl,

    #[error("Null or unrecognized intent action")]
    UnrecognizedIntent,

    #[error("Nothing is playing")]
    NoActiveSession,

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Stream server returned HTTP {0}")]
    Http(u16),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error(transparent)]
    Player(#[from] PlayerError),
}

/// What the host asked the playback screen to play
#[derive(Debug, Clone)]
pub enum Intent {
    /// User picked a channel in the catalog
    Channel(Channel),
    /// Legacy flat record
    Movie(Movie),
    Unrecognized,
}

/// Queue entry metadata for the session / queue navigation surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaDescription {
    pub title: String,
    pub subtitle: String,
    pub icon_uri: Option<String>,
}

/// Host reaction to a fatal playback error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Show the message and close the playback screen
    Finish { message: String },
}

/// The active playback
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSession {
    pub id: Uuid,
    pub queue: Vec<MediaSource>,
    pub index: usize,
    #[serde(with = "duration_secs")]
    pub start_position: Duration,
    pub paused: bool,
}

impl PlaybackSession {
    pub fn current(&self) -> Option<&MediaSource> {
        self.queue.get(self.index)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

/// Drives a single player backend
pub struct PlaybackController<B: PlayerBackend> {
    backend: B,
    session: Option<PlaybackSession>,
}

impl<B: PlayerBackend> PlaybackController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Dispatch a host intent to the matching playback path
    pub fn process_intent(
        &mut self,
        intent: Intent,
        playlist: &[Movie],
    ) -> Result<&PlaybackSession, PlaybackError> {
        debug!("processIntent");
        match intent {
            Intent::Channel(channel) => self.start_from_channel(Some(&channel), Duration::ZERO),
            Intent::Movie(movie) => self.start_from_movie(&movie, playlist, Duration::ZERO),
            Intent::Unrecognized => {
                warn!("Null or unrecognized intent action");
                Err(PlaybackError::UnrecognizedIntent)
            }
        }
    }

    /// Play a channel's primary stream link with its request headers
    pub fn start_from_channel(
        &mut self,
        channel: Option<&Channel>,
        start_position: Duration,
    ) -> Result<&PlaybackSession, PlaybackError> {
        let channel = channel.ok_or_else(|| {
            warn!("Channel is null");
            PlaybackError::NullChannel
        })?;

        let source = MediaSource::from_channel(channel).map_err(|e| {
            warn!(channel = %channel.id, "No valid stream URL found");
            e
        })?;
        debug!(
            channel = %channel.id,
            kind = %source.kind,
            headers = source.headers().len(),
            "Starting playback from channel"
        );

        self.start(vec![source], start_position)
    }

    /// Play a legacy movie followed by the rest of the playlist
    pub fn start_from_movie(
        &mut self,
        movie: &Movie,
        playlist: &[Movie],
        start_position: Duration,
    ) -> Result<&PlaybackSession, PlaybackError> {
        let mut queue = vec![MediaSource::from_movie(movie)?];
        for entry in playlist {
            match MediaSource::from_movie(entry) {
                Ok(source) => queue.push(source),
                Err(_) => debug!(movie = entry.id, "Skipping playlist entry without URL"),
            }
        }

        self.start(queue, start_position)
    }

    fn start(
        &mut self,
        queue: Vec<MediaSource>,
        start_position: Duration,
    ) -> Result<&PlaybackSession, PlaybackError> {
        // At most one active player
        self.release();
        self.backend.load(&queue, 0, start_position)?;

        let session = PlaybackSession {
            id: Uuid::new_v4(),
            queue,
            index: 0,
            start_position,
            paused: false,
        };
        debug!(session = %session.id, items = session.queue.len(), "Playback prepared");
        Ok(self.session.insert(session))
    }

    /// Skip to the next queue entry; false when already at the end
    pub fn next(&mut self) -> Result<bool, PlaybackError> {
        self.skip_to(|index, len| (index + 1 < len).then_some(index + 1))
    }

    /// Go back one queue entry; false when already at the start
    pub fn previous(&mut self) -> Result<bool, PlaybackError> {
        self.skip_to(|index, _| index.checked_sub(1))
    }

    fn skip_to(
        &mut self,
        target: impl FnOnce(usize, usize) -> Option<usize>,
    ) -> Result<bool, PlaybackError> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        let Some(index) = target(session.index, session.queue.len()) else {
            return Ok(false);
        };

        self.backend.load(&session.queue, index, Duration::ZERO)?;
        session.index = index;
        session.start_position = Duration::ZERO;
        session.paused = false;
        Ok(true)
    }

    /// Host went to the background; the session is only marked paused once
    /// the backend has paused
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        if !session.paused {
            self.backend.pause()?;
            session.paused = true;
        }
        Ok(())
    }

    /// Continue a paused session
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        if session.paused {
            self.backend.resume()?;
            session.paused = false;
        }
        Ok(())
    }

    /// Host stopped; free the player
    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(session = %session.id, "releasePlayer");
        }
        self.backend.release();
    }

    /// Metadata for a queue entry
    pub fn media_description(&self, index: usize) -> Option<MediaDescription> {
        let source = self.session.as_ref()?.queue.get(index)?;
        let metadata = &source.item.metadata;
        Some(MediaDescription {
            title: metadata.title.clone(),
            subtitle: metadata.subtitle.clone(),
            icon_uri: metadata.artwork_uri.clone(),
        })
    }

    /// Title and subtitle of the current entry (empty when nothing is loaded)
    pub fn now_playing(&self) -> MediaDescription {
        self.session
            .as_ref()
            .and_then(|session| self.media_description(session.index))
            .unwrap_or_default()
    }

    /// Player reported a fatal error
    pub fn on_error(&mut self, code: i32, message: &str) -> PlaybackOutcome {
        error!(code, "Playback error: {}", message);
        self.release();
        PlaybackOutcome::Finish {
            message: message.to_string(),
        }
    }
}
