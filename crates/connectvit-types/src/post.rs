//! Photo-post feed types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post with the usernames that liked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub username: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
    pub likes: Vec<String>,
}

/// Data required to create a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub username: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
}

/// Payload for `POST /api/posts/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub image_url: String,
}

/// What a like toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl std::fmt::Display for LikeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikeAction::Liked => write!(f, "liked"),
            LikeAction::Unliked => write!(f, "unliked"),
        }
    }
}
