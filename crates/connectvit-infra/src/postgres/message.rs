//! PostgreSQL message repository implementation.

use connectvit_core::realtime::parse_room;
use connectvit_core::repository::MessageRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::message::{
    ChatMessage, DirectMessage, GroupMessage, NewDirectMessage, NewGroupMessage,
};
use connectvit_types::room::{Room, RoomId};
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::pool::PgDatabasePool;
use super::stored_datetime;
use crate::error::{address_error, query_error};

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgDatabasePool,
}

impl PgMessageRepository {
    pub fn new(pool: PgDatabasePool) -> Self {
        Self { pool }
    }
}

fn direct_from(row: &PgRow) -> Result<DirectMessage, sqlx::Error> {
    Ok(DirectMessage {
        id: row.try_get("id")?,
        sender: row.try_get("sender")?,
        receiver: row.try_get("receiver")?,
        message: row.try_get("message")?,
        timestamp: row.try_get("timestamp")?,
    })
}

fn group_from(row: &PgRow) -> Result<GroupMessage, sqlx::Error> {
    Ok(GroupMessage {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        sender: row.try_get("sender")?,
        message: row.try_get("message")?,
        timestamp: row.try_get("timestamp")?,
    })
}

impl MessageRepository for PgMessageRepository {
    async fn create_message(
        &self,
        message: &NewDirectMessage,
    ) -> Result<DirectMessage, RepositoryError> {
        let timestamp = stored_datetime(&message.timestamp);
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO messages (sender, receiver, message, timestamp)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(&message.sender)
        .bind(&message.receiver)
        .bind(&message.message)
        .bind(timestamp)
        .fetch_one(&self.pool.pool)
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
        let timestamp = stored_datetime(&message.timestamp);
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO group_messages (group_id, sender, message, timestamp)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(message.group_id)
        .bind(&message.sender)
        .bind(&message.message)
        .bind(timestamp)
        .fetch_one(&self.pool.pool)
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
               WHERE (sender = $1 AND receiver = $2) OR (sender = $2 AND receiver = $1)
               ORDER BY timestamp ASC, id ASC"#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(direct_from)
            .collect::<Result<_, _>>()
            .map_err(query_error)
    }

    async fn get_group_messages(&self, group_id: i64) -> Result<Vec<GroupMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, group_id, sender, message, timestamp FROM group_messages
               WHERE group_id = $1
               ORDER BY timestamp ASC, id ASC"#,
        )
        .bind(group_id)
        .fetch_all(&self.pool.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(group_from)
            .collect::<Result<_, _>>()
            .map_err(query_error)
    }

    async fn get_conversation_participants(
        &self,
        username: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar(
            r#"SELECT DISTINCT
                   CASE WHEN sender = $1 THEN receiver ELSE sender END AS participant
               FROM messages
               WHERE sender = $1 OR receiver = $1
               ORDER BY participant"#,
        )
        .bind(username)
        .fetch_all(&self.pool.pool)
        .await
        .map_err(query_error)
    }

    async fn get_recent_message(
        &self,
        room: &RoomId,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let room = parse_room(room).map_err(address_error)?;
        let message = match &room {
            Room::Direct { a, b } => sqlx::query(
                r#"SELECT id, sender, receiver, message, timestamp FROM messages
                   WHERE (sender = $1 AND receiver = $2) OR (sender = $2 AND receiver = $1)
                   ORDER BY timestamp DESC, id DESC
                   LIMIT 1"#,
            )
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool.pool)
            .await
            .and_then(|row| row.as_ref().map(direct_from).transpose())
            .map(|m| m.map(ChatMessage::Direct)),
            Room::Group { group_id } => sqlx::query(
                r#"SELECT id, group_id, sender, message, timestamp FROM group_messages
                   WHERE group_id = $1
                   ORDER BY timestamp DESC, id DESC
                   LIMIT 1"#,
            )
            .bind(*group_id)
            .fetch_optional(&self.pool.pool)
            .await
            .and_then(|row| row.as_ref().map(group_from).transpose())
            .map(|m| m.map(ChatMessage::Group)),
        };
        message.map_err(query_error)
    }
}
