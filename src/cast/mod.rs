//! Cast receiver
//!
//! Handles Cast-originated `LOAD` commands: a request carrying request
//! headers in its custom data is replayed as a synthetic channel so it goes
//! through the same header-aware playback path as catalog channels; anything
//! else falls back to the legacy movie path.
//!
//! - Media: wire payloads and their translation to catalog models
//! - Message: JSON-lines transport for inbound commands

pub mod media;
pub mod message;

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapter;
use crate::catalog::CatalogStore;
use crate::playback::{PlaybackController, PlayerBackend};

pub use media::{
    fill_media_info, load_request_to_movie, media_info_to_channel, stream_type_for_content_type,
    CastMediaMetadata, MediaInfo, MediaLoadRequest, WebImage,
};
pub use message::{InboundMessage, OutboundMessage};

/// Cast detailed error code for a failed load
pub const DETAILED_ERROR_LOAD_FAILED: u16 = 905;

/// Cast error reasons reported to the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorReason {
    InvalidRequest,
    GenericLoadError,
}

/// Error returned to a Cast sender
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Media load failed (code {detailed_error_code}, {reason:?})")]
#[serde(rename_all = "camelCase")]
pub struct MediaError {
    pub detailed_error_code: u16,
    pub reason: ErrorReason,
}

impl MediaError {
    pub fn invalid_request() -> Self {
        Self {
            detailed_error_code: DETAILED_ERROR_LOAD_FAILED,
            reason: ErrorReason::InvalidRequest,
        }
    }

    pub fn load_failed() -> Self {
        Self {
            detailed_error_code: DETAILED_ERROR_LOAD_FAILED,
            reason: ErrorReason::GenericLoadError,
        }
    }
}

/// Errors decoding inbound Cast messages
#[derive(Error, Debug)]
pub enum CastError {
    #[error("Invalid Cast message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
}

/// Media status broadcast to senders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatus {
    pub media_session_id: u32,
    pub player_state: PlayerState,
    pub current_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaInfo>,
    pub custom_data: Value,
}

/// Custom data attached to every outgoing media status
fn status_custom_data() -> Value {
    json!({ "data": "CustomData" })
}

/// Cast load command handler bound to a player
pub struct CastReceiver<B: PlayerBackend> {
    controller: PlaybackController<B>,
    store: CatalogStore,
    status: Option<MediaStatus>,
    next_session_id: u32,
}

impl<B: PlayerBackend> CastReceiver<B> {
    pub fn new(controller: PlaybackController<B>, store: CatalogStore) -> Self {
        Self {
            controller,
            store,
            status: None,
            next_session_id: 1,
        }
    }

    pub fn controller(&self) -> &PlaybackController<B> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<B> {
        &mut self.controller
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Handle a `LOAD` command.
    ///
    /// A request without media is rejected as invalid. Otherwise the media is
    /// resolved, played, and becomes the current media status.
    pub fn on_load(
        &mut self,
        sender_id: Option<&str>,
        request: Option<MediaLoadRequest>,
    ) -> Result<MediaLoadRequest, MediaError> {
        info!(sender = sender_id.unwrap_or("unknown"), "onLoad()");
        let mut request = request.ok_or_else(MediaError::invalid_request)?;
        let start_position = start_position(request.current_time);

        let media = request.media.as_mut().ok_or_else(MediaError::invalid_request)?;
        fill_media_info(media, &self.store);

        let result = if media.has_custom_headers() {
            let channel = media_info_to_channel(media);
            debug!(
                headers = ?media.custom_headers(),
                "Starting playback from channel with headers"
            );
            self.controller
                .start_from_channel(Some(&channel), start_position)
                .map(|_| ())
        } else {
            debug!("Starting regular playback without headers");
            let movie = load_request_to_movie(&request).ok_or_else(MediaError::invalid_request)?;
            let playlist = self
                .store
                .get()
                .map(|channels| adapter::channels_to_movies(&channels))
                .unwrap_or_default();
            self.controller
                .start_from_movie(&movie, &playlist, start_position)
                .map(|_| ())
        };

        if let Err(e) = result {
            warn!("Cast load failed: {}", e);
            return Err(MediaError::load_failed());
        }

        let player_state = if request.autoplay == Some(false) && self.pause_player() {
            PlayerState::Paused
        } else {
            PlayerState::Playing
        };
        self.set_data_from_load(&request, player_state);
        Ok(request)
    }

    /// Replace the media status with the loaded request (clears overrides)
    fn set_data_from_load(&mut self, request: &MediaLoadRequest, player_state: PlayerState) {
        let media_session_id = self.next_session_id;
        self.next_session_id += 1;

        self.status = Some(MediaStatus {
            media_session_id,
            player_state,
            current_time: start_position(request.current_time).as_secs_f64(),
            media: request.media.clone(),
            custom_data: status_custom_data(),
        });
    }

    /// Current media status; idle when nothing was loaded
    pub fn media_status(&self) -> MediaStatus {
        self.status.clone().unwrap_or_else(|| MediaStatus {
            media_session_id: 0,
            player_state: PlayerState::Idle,
            current_time: 0.0,
            media: None,
            custom_data: status_custom_data(),
        })
    }

    /// Pause the player; the status only turns `PAUSED` if the player paused
    pub fn pause(&mut self) {
        if self.pause_player() {
            self.set_player_state(PlayerState::Paused);
        }
    }

    /// Resume a paused player
    pub fn play(&mut self) {
        match self.controller.resume() {
            Ok(()) => self.set_player_state(PlayerState::Playing),
            Err(e) => warn!("Resume failed: {}", e),
        }
    }

    fn pause_player(&mut self) -> bool {
        match self.controller.pause() {
            Ok(()) => true,
            Err(e) => {
                warn!("Pause failed: {}", e);
                false
            }
        }
    }

    fn set_player_state(&mut self, player_state: PlayerState) {
        if let Some(status) = self.status.as_mut() {
            status.player_state = player_state;
        }
    }

    /// Stop playback and release the player
    pub fn stop(&mut self) {
        self.controller.release();
        self.set_player_state(PlayerState::Idle);
    }
}

/// Start offset from a sender-supplied `currentTime`
fn start_position(current_time: Option<f64>) -> Duration {
    current_time
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or_default()
}
