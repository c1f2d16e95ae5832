//! Wire protocol for the relay channel.
//!
//! One JSON object per WebSocket text frame.  Inbound frames deserialize
//! into [`ClientEvent`]; anything the server writes back is a
//! [`ServerEvent`].  Deserialization is strict about the parts that matter:
//! a missing field or an unrecognized `type` fails, and the relay treats
//! that failure as fatal for the channel.

use serde::{Deserialize, Serialize};

use crate::identity::Username;

/// Payload kind carried by a chat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Media,
}

impl MessageKind {
    /// Stable string form, used both on the wire and in the message log.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Media => "media",
        }
    }
}

/// Inbound chat event from a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEvent {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub sender: Username,
    pub receiver: Username,
    pub message: String,
}

/// Outbound event written to a relay channel.
///
/// The ack back to the sender omits `timestamp`; the copy forwarded to the
/// receiver carries the server-assigned one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEvent {
    pub sender: Username,
    pub receiver: Username,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ServerEvent {
    /// Acknowledgement to the sender's own channel.
    pub fn ack(sender: Username, receiver: Username, message: String, kind: MessageKind) -> Self {
        Self {
            sender,
            receiver,
            message,
            kind,
            timestamp: None,
        }
    }

    /// Live copy forwarded to the receiver, stamped with the logged time.
    pub fn relayed(
        sender: Username,
        receiver: Username,
        message: String,
        kind: MessageKind,
        timestamp: String,
    ) -> Self {
        Self {
            sender,
            receiver,
            message,
            kind,
            timestamp: Some(timestamp),
        }
    }
}
