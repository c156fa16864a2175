//! Trip chat messages and the frames exchanged on a live channel
//!
//! Messages carry a per-trip [`MessageId`] allocated in creation order.
//! A sender may attach a [`CorrelationToken`]; the broadcast echoes it so
//! the sending client can replace its optimistic local copy without
//! guessing by content and author.

use crate::core::error::DomainError;
use crate::core::ids::{MessageId, TripId, UserId};
use crate::phase::{Phase, PhaseStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted message body, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Client-chosen token echoed back with the persisted message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A persisted chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub trip_id: TripId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationToken>,
}

/// Message body before an id has been allocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub trip_id: TripId,
    pub user_id: UserId,
    pub content: String,
    pub correlation: Option<CorrelationToken>,
}

impl NewChatMessage {
    /// Build a message body, trimming and validating the content.
    pub fn new(
        trip_id: TripId,
        user_id: UserId,
        content: &str,
        correlation: Option<CorrelationToken>,
    ) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::Invalid("message content is empty".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(DomainError::Invalid(format!(
                "message content exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(Self {
            trip_id,
            user_id,
            content: content.to_string(),
            correlation,
        })
    }

    /// Stamp the allocated id and creation time.
    pub fn into_message(self, message_id: MessageId, created_at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            trip_id: self.trip_id,
            message_id,
            user_id: self.user_id,
            content: self.content,
            created_at,
            correlation: self.correlation,
        }
    }
}

/// Error codes reported on the channel itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelErrorCode {
    /// Caller is not a member; refresh membership instead of reconnecting
    Unauthorized,
    NotFound,
    InvalidFrame,
    /// The connection fell behind and was dropped; reconnect with `since`
    Lagged,
    Internal,
}

/// Frames pushed from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Welcome {
        trip_id: TripId,
        user_id: UserId,
        last_message_id: MessageId,
        reconnect_backoff_secs: u64,
    },
    Message {
        message: ChatMessage,
    },
    PhaseStatus {
        trip_id: TripId,
        status: PhaseStatus,
    },
    PhaseComplete {
        trip_id: TripId,
        phase: Phase,
    },
    Error {
        code: ChannelErrorCode,
        message: String,
        refresh_membership: bool,
    },
}

impl ServerFrame {
    pub fn error(code: ChannelErrorCode, message: impl Into<String>) -> Self {
        ServerFrame::Error {
            code,
            refresh_membership: code == ChannelErrorCode::Unauthorized,
            message: message.into(),
        }
    }

    /// Message id carried by this frame, if it is a chat message
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            ServerFrame::Message { message } => Some(message.message_id),
            _ => None,
        }
    }
}

/// Frames sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Send {
        content: String,
        #[serde(default)]
        correlation: Option<CorrelationToken>,
    },
    Ping,
}
