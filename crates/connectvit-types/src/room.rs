//! Room identifiers.
//!
//! A room is the logical broadcast group for one conversation. Canonical ids
//! are produced by the addressing functions in `connectvit-core`; this module
//! only holds the value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical string identifying a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap an already-canonical room string.
    pub fn from_canonical(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The conversation a room stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Room {
    /// Two-party conversation. `a <= b` in byte order.
    Direct { a: String, b: String },
    /// Group conversation.
    Group { group_id: i64 },
}
