//! JSON-lines Cast message transport
//!
//! Each inbound line is one media-namespace message (`LOAD`, `GET_STATUS`,
//! `PAUSE`, `PLAY`, `STOP`); each reply is one line echoing the sender's `requestId`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{CastError, CastReceiver, MediaError, MediaLoadRequest, MediaStatus};
use crate::playback::PlayerBackend;

/// Messages accepted from senders
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    Load(MediaLoadRequest),
    GetStatus {
        #[serde(rename = "requestId", default)]
        request_id: Option<i64>,
    },
    Pause {
        #[serde(rename = "requestId", default)]
        request_id: Option<i64>,
    },
    Play {
        #[serde(rename = "requestId", default)]
        request_id: Option<i64>,
    },
    Stop {
        #[serde(rename = "requestId", default)]
        request_id: Option<i64>,
    },
}

impl InboundMessage {
    pub fn parse(line: &str) -> Result<Self, CastError> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn request_id(&self) -> Option<i64> {
        match self {
            InboundMessage::Load(request) => request.request_id,
            InboundMessage::GetStatus { request_id }
            | InboundMessage::Pause { request_id }
            | InboundMessage::Play { request_id }
            | InboundMessage::Stop { request_id } => *request_id,
        }
    }
}

/// Replies sent back to senders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    MediaStatus {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<i64>,
        status: Vec<MediaStatus>,
    },
    Error {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<i64>,
        #[serde(flatten)]
        error: MediaError,
    },
    InvalidRequest {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<i64>,
        reason: String,
    },
}

impl OutboundMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"INVALID_REQUEST","reason":"{}"}}"#, e)
        })
    }
}

impl<B: PlayerBackend> CastReceiver<B> {
    /// Handle one inbound message
    pub fn handle(&mut self, message: InboundMessage) -> OutboundMessage {
        let request_id = message.request_id();
        match message {
            InboundMessage::Load(request) => match self.on_load(None, Some(request)) {
                Ok(_) => self.status_message(request_id),
                Err(error) => OutboundMessage::Error { request_id, error },
            },
            InboundMessage::GetStatus { .. } => self.status_message(request_id),
            InboundMessage::Pause { .. } => {
                self.pause();
                self.status_message(request_id)
            }
            InboundMessage::Play { .. } => {
                self.play();
                self.status_message(request_id)
            }
            InboundMessage::Stop { .. } => {
                self.stop();
                self.status_message(request_id)
            }
        }
    }

    /// Handle one raw JSON line; blank lines produce no reply
    pub fn handle_line(&mut self, line: &str) -> Option<OutboundMessage> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match InboundMessage::parse(line) {
            Ok(message) => Some(self.handle(message)),
            Err(e) => {
                warn!("{}", e);
                Some(OutboundMessage::InvalidRequest {
                    request_id: serde_json::from_str::<serde_json::Value>(line)
                        .ok()
                        .and_then(|v| v.get("requestId").and_then(|id| id.as_i64())),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn status_message(&self, request_id: Option<i64>) -> OutboundMessage {
        OutboundMessage::MediaStatus {
            request_id,
            status: vec![self.media_status()],
        }
    }
}
