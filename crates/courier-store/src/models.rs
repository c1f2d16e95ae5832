//! Domain model structs persisted in the courier database.
//!
//! Every struct derives `Serialize` so it can be handed directly to the
//! HTTP layer as a JSON body.

use serde::{Deserialize, Serialize};

pub use courier_shared::protocol::MessageKind;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single relayed chat message, as durably logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMessage {
    /// Monotonic id assigned on append.  Strictly increasing, never reused,
    /// and totally ordered across all conversation pairs.
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub kind: MessageKind,
    /// Raw text, or the blob filename for media messages.
    pub payload: String,
    /// Server-assigned UTC timestamp, `"YYYY-MM-DD HH:MM:SS"`.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Friendship graph
// ---------------------------------------------------------------------------

/// Status of a directed friendship edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    Pending,
    Friend,
}

impl EdgeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeStatus::Pending => "pending",
            EdgeStatus::Friend => "friend",
        }
    }
}

/// A directed friendship edge.  A `Pending` edge records who asked whom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendEdge {
    pub id: i64,
    pub from: String,
    pub to: String,
    pub status: EdgeStatus,
    /// Stamp of the request (and re-stamped on accept), `"YYYY-MM-DD"`.
    pub date: String,
}

/// The pairwise relationship as seen from one side.
///
/// Derived from both edge directions with fixed precedence:
/// `CanAccept > PendingSent > Friend > None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationStatus {
    None,
    PendingSent,
    CanAccept,
    Friend,
}

/// A search hit: an identity plus the relationship toward the searcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityMatch {
    pub username: String,
    pub status: RelationStatus,
}

// ---------------------------------------------------------------------------
// Recent chats
// ---------------------------------------------------------------------------

/// A per-owner bookmark of a recently opened conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentChat {
    pub owner: String,
    pub peer: String,
    pub last_opened: String,
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Coarse presence for one identity.
///
/// Created when the identity is registered and mutated only by explicit
/// presence calls -- never as a side effect of a channel opening or closing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceRecord {
    pub identity: String,
    pub is_online: bool,
    pub last_seen: String,
}
