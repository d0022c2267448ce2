//! SQLite message repository implementation.
//!
//! Implements `MessageRepository` from `connectvit-core` using sqlx with split
//! read/write pools. Direct messages live in `messages`, group messages in
//! `group_messages`.

use connectvit_core::realtime::parse_room;
use connectvit_core::repository::MessageRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::message::{
    ChatMessage, DirectMessage, GroupMessage, NewDirectMessage, NewGroupMessage,
};
use connectvit_types::room::{Room, RoomId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{parse_datetime, stored_datetime};
use crate::error::{address_error, query_error};

/// SQLite-backed implementation of `MessageRepository`.
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row types
// ---------------------------------------------------------------------------

struct DirectMessageRow {
    id: i64,
    sender: String,
    receiver: String,
    message: String,
    timestamp: String,
}

impl DirectMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            sender: row.try_get("sender")?,
            receiver: row.try_get("receiver")?,
            message: row.try_get("message")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<DirectMessage, RepositoryError> {
        Ok(DirectMessage {
            id: self.id,
            sender: self.sender,
            receiver: self.receiver,
            message: self.message,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

struct GroupMessageRow {
    id: i64,
    group_id: i64,
    sender: String,
    message: String,
    timestamp: String,
}

impl GroupMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            group_id: row.try_get("group_id")?,
            sender: row.try_get("sender")?,
            message: row.try_get("message")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<GroupMessage, RepositoryError> {
        Ok(GroupMessage {
            id: self.id,
            group_id: self.group_id,
            sender: self.sender,
            message: self.message,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

fn direct_from(row: &sqlx::sqlite::SqliteRow) -> Result<DirectMessage, RepositoryError> {
    DirectMessageRow::from_row(row)
        .map_err(query_error)?
        .into_message()
}

fn group_from(row: &sqlx::sqlite::SqliteRow) -> Result<GroupMessage, RepositoryError> {
    GroupMessageRow::from_row(row)
        .map_err(query_error)?
        .into_message()
}

// ---------------------------------------------------------------------------
// MessageRepository impl
// ---------------------------------------------------------------------------

impl MessageRepository for SqliteMessageRepository {
    async fn create_message(
        &self,
        message: &NewDirectMessage,
    ) -> Result<DirectMessage, RepositoryError> {
        let (timestamp_text, timestamp) = stored_datetime(&message.timestamp)?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO messages (sender, receiver, message, timestamp)
               VALUES (?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(&message.sender)
        .bind(&message.receiver)
        .bind(&message.message)
        .bind(&timestamp_text)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(DirectMessage {
            id,
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            message: message.message.clone(),
            timestamp,
        })
    }

    async fn create_group_message(
        &self,
        message: &NewGroupMessage,
    ) -> Result<GroupMessage, RepositoryError> {
        let (timestamp_text, timestamp) = stored_datetime(&message.timestamp)?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO group_messages (group_id, sender, message, timestamp)
               VALUES (?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(message.group_id)
        .bind(&message.sender)
        .bind(&message.message)
        .bind(&timestamp_text)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(GroupMessage {
            id,
            group_id: message.group_id,
            sender: message.sender.clone(),
            message: message.message.clone(),
            timestamp,
        })
    }

    async fn get_messages_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, sender, receiver, message, timestamp FROM messages
               WHERE (sender = ? AND receiver = ?) OR (sender = ? AND receiver = ?)
               ORDER BY timestamp ASC, id ASC"#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter().map(direct_from).collect()
    }

    async fn get_group_messages(&self, group_id: i64) -> Result<Vec<GroupMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, group_id, sender, message, timestamp FROM group_messages
               WHERE group_id = ?
               ORDER BY timestamp ASC, id ASC"#,
        )
        .bind(group_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter().map(group_from).collect()
    }

    async fn get_conversation_participants(
        &self,
        username: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar(
            r#"SELECT DISTINCT
                   CASE WHEN sender = ? THEN receiver ELSE sender END AS participant
               FROM messages
               WHERE sender = ? OR receiver = ?
               ORDER BY participant"#,
        )
        .bind(username)
        .bind(username)
        .bind(username)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)
    }

    async fn get_recent_message(
        &self,
        room: &RoomId,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let room = parse_room(room).map_err(address_error)?;
        match &room {
            Room::Direct { a, b } => {
                let row = sqlx::query(
                    r#"SELECT id, sender, receiver, message, timestamp FROM messages
                       WHERE (sender = ? AND receiver = ?) OR (sender = ? AND receiver = ?)
                       ORDER BY timestamp DESC, id DESC
                       LIMIT 1"#,
                )
                .bind(a)
                .bind(b)
                .bind(b)
                .bind(a)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_error)?;

                row.as_ref()
                    .map(direct_from)
                    .transpose()
                    .map(|m| m.map(ChatMessage::Direct))
            }
            Room::Group { group_id } => {
                let row = sqlx::query(
                    r#"SELECT id, group_id, sender, message, timestamp FROM group_messages
                       WHERE group_id = ?
                       ORDER BY timestamp DESC, id DESC
                       LIMIT 1"#,
                )
                .bind(*group_id)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_error)?;

                row.as_ref()
                    .map(group_from)
                    .transpose()
                    .map(|m| m.map(ChatMessage::Group))
            }
        }
    }
}
