//! Storage gateway: one handle over whichever SQL backend the URL names.
//!
//! The repository traits return `impl Future`, so they cannot be used as
//! trait objects. `Gateway` is a closed enum over the two backends instead
//! and forwards every call to the matching repository.

use chrono::{DateTime, Utc};
use connectvit_core::repository::{
    GroupRepository, MessageRepository, PostRepository, UserRepository,
};
use connectvit_types::config::DatabaseConfig;
use connectvit_types::error::RepositoryError;
use connectvit_types::group::{Group, GroupListing, GroupMember, LeaveOutcome, NewGroup, UserGroup};
use connectvit_types::message::{
    ChatMessage, DirectMessage, GroupMessage, NewDirectMessage, NewGroupMessage,
};
use connectvit_types::post::{LikeAction, NewPost, Post};
use connectvit_types::room::RoomId;
use connectvit_types::user::{NewUser, User};

use crate::error::GatewayError;
use crate::postgres::{PgDatabasePool, PgGateway};
use crate::sqlite::{DatabasePool, SqliteGateway};

/// Storage handle shared by every service.
#[derive(Clone)]
pub enum Gateway {
    Sqlite(SqliteGateway),
    Postgres(PgGateway),
}

impl Gateway {
    /// Connect to `url` and run migrations.
    ///
    /// `sqlite:` URLs open the split WAL pools; `postgres:` and
    /// `postgresql:` URLs open a shared pool.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, GatewayError> {
        if url.starts_with("sqlite:") {
            let pool = DatabasePool::with_config(url, config).await?;
            tracing::info!(backend = "sqlite", "storage gateway connected");
            Ok(Gateway::Sqlite(SqliteGateway::new(pool)))
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            let pool = PgDatabasePool::with_config(url, config).await?;
            tracing::info!(backend = "postgres", "storage gateway connected");
            Ok(Gateway::Postgres(PgGateway::new(pool)))
        } else {
            Err(GatewayError::UnsupportedUrl(redact(url)))
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Gateway::Sqlite(_) => "sqlite",
            Gateway::Postgres(_) => "postgres",
        }
    }

    pub async fn close(&self) {
        match self {
            Gateway::Sqlite(g) => g.pool.close().await,
            Gateway::Postgres(g) => g.pool.close().await,
        }
    }
}

/// Keep credentials out of error messages.
fn redact(url: &str) -> String {
    match url.split_once('@') {
        Some((_, host)) => format!("***@{host}"),
        None => url.to_string(),
    }
}

macro_rules! forward {
    ($repo:ident { $( fn $name:ident(&self $(, $arg:ident : $ty:ty)*) -> $ret:ty; )* }) => {
        $(
            async fn $name(&self $(, $arg: $ty)*) -> Result<$ret, RepositoryError> {
                match self {
                    Gateway::Sqlite(g) => g.$repo.$name($($arg),*).await,
                    Gateway::Postgres(g) => g.$repo.$name($($arg),*).await,
                }
            }
        )*
    };
}

impl MessageRepository for Gateway {
    forward!(messages {
        fn create_message(&self, message: &NewDirectMessage) -> DirectMessage;
        fn create_group_message(&self, message: &NewGroupMessage) -> GroupMessage;
        fn get_messages_between(&self, a: &str, b: &str) -> Vec<DirectMessage>;
        fn get_group_messages(&self, group_id: i64) -> Vec<GroupMessage>;
        fn get_conversation_participants(&self, username: &str) -> Vec<String>;
        fn get_recent_message(&self, room: &RoomId) -> Option<ChatMessage>;
    });
}

impl GroupRepository for Gateway {
    forward!(groups {
        fn is_group_member(&self, username: &str, group_id: i64) -> bool;
        fn create_group(&self, group: &NewGroup) -> Group;
        fn get_group(&self, group_id: i64) -> Option<Group>;
        fn list_user_groups(&self, username: &str) -> Vec<UserGroup>;
        fn list_all_groups(&self) -> Vec<GroupListing>;
        fn list_members(&self, group_id: i64) -> Vec<GroupMember>;
        fn get_member(&self, group_id: i64, username: &str) -> Option<GroupMember>;
        fn add_member(&self, group_id: i64, username: &str, is_admin: bool, joined_at: DateTime<Utc>) -> ();
        fn count_admins(&self, group_id: i64) -> i64;
        fn count_members(&self, group_id: i64) -> i64;
        fn remove_member(&self, group_id: i64, username: &str) -> LeaveOutcome;
    });
}

impl UserRepository for Gateway {
    forward!(users {
        fn create_user(&self, user: &NewUser) -> User;
        fn get_user_by_username(&self, username: &str) -> Option<User>;
        fn list_users(&self) -> Vec<User>;
        fn get_bio(&self, username: &str) -> Option<String>;
        fn upsert_bio(&self, username: &str, bio: &str, updated_at: DateTime<Utc>) -> ();
    });
}

impl PostRepository for Gateway {
    forward!(posts {
        fn list_posts(&self) -> Vec<Post>;
        fn create_post(&self, post: &NewPost) -> Post;
        fn post_exists(&self, post_id: i64) -> bool;
        fn toggle_like(&self, post_id: i64, username: &str, at: DateTime<Utc>) -> LikeAction;
        fn get_likes(&self, post_id: i64) -> Vec<String>;
    });
}
