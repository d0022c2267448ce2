//! Direct and group message types.
//!
//! Messages are immutable once persisted. The id is assigned by storage and
//! the timestamp by the server at the moment persistence begins; client
//! supplied timestamps are never trusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted one-to-one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A persisted group message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: i64,
    pub sender: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A direct message about to be written. Carries the server timestamp.
#[derive(Debug, Clone)]
pub struct NewDirectMessage {
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A group message about to be written. Carries the server timestamp.
#[derive(Debug, Clone)]
pub struct NewGroupMessage {
    pub group_id: i64,
    pub sender: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Either kind of persisted message, as returned by room-level lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessage {
    Direct(DirectMessage),
    Group(GroupMessage),
}

impl ChatMessage {
    pub fn sender(&self) -> &str {
        match self {
            ChatMessage::Direct(m) => &m.sender,
            ChatMessage::Group(m) => &m.sender,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            ChatMessage::Direct(m) => &m.message,
            ChatMessage::Group(m) => &m.message,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatMessage::Direct(m) => m.timestamp,
            ChatMessage::Group(m) => m.timestamp,
        }
    }
}

/// One entry of a user's chat list (`GET /api/chat-history`).
///
/// Field names follow the JSON the web client already consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatSummary {
    Direct {
        participants: [String; 2],
        #[serde(rename = "lastMessage")]
        last_message: String,
        timestamp: DateTime<Utc>,
    },
    Group {
        group_id: i64,
        group_name: String,
        #[serde(rename = "lastMessage")]
        last_message: String,
        sender: String,
        timestamp: DateTime<Utc>,
    },
}

impl ChatSummary {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatSummary::Direct { timestamp, .. } | ChatSummary::Group { timestamp, .. } => {
                *timestamp
            }
        }
    }
}
