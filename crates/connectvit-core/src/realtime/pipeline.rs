//! Message ingest and fan-out.
//!
//! `MessagingService` is the only path by which a chat message enters the
//! system: validate, stamp with the server clock, persist through the
//! repository under a timeout, and only then broadcast to the room. A message
//! that fails to persist is never broadcast. Broadcast problems are logged and
//! never change the result returned to the sender.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use connectvit_types::error::{MessagingError, RepositoryError};
use connectvit_types::event::ServerEvent;
use connectvit_types::message::{DirectMessage, GroupMessage, NewDirectMessage, NewGroupMessage};
use connectvit_types::room::RoomId;
use tracing::{debug, info, warn};

use super::addressing::{room_for_direct, room_for_group, validate_identity};
use super::registry::RoomRegistry;
use super::session::Session;
use crate::repository::{GroupRepository, MessageRepository};

/// Default bound on a single persistence call.
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Real-time messaging service.
///
/// Generic over the storage gateway so it can be exercised against
/// in-memory stores in tests and either SQL backend in production.
pub struct MessagingService<R: MessageRepository + GroupRepository> {
    repo: R,
    registry: RoomRegistry,
    persist_timeout: Duration,
}

impl<R: MessageRepository + GroupRepository> MessagingService<R> {
    pub fn new(repo: R, registry: RoomRegistry) -> Self {
        Self {
            repo,
            registry,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
        }
    }

    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Persist a direct message, then broadcast `receive_message` to the
    /// conversation's room.
    pub async fn send_direct(
        &self,
        sender: &str,
        receiver: &str,
        body: &str,
    ) -> Result<DirectMessage, MessagingError> {
        require("sender", sender)?;
        require("receiver", receiver)?;
        require("message", body)?;
        let room = room_for_direct(sender, receiver)?;

        let new = NewDirectMessage {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            message: body.to_string(),
            timestamp: Utc::now(),
        };
        let stored = self
            .persist("create_message", self.repo.create_message(&new))
            .await?;
        info!(%room, message_id = stored.id, %sender, "direct message stored");

        self.fan_out(&room, ServerEvent::ReceiveMessage(stored.clone()));
        Ok(stored)
    }

    /// Persist a group message from a durable member, then broadcast
    /// `receive_group_message` to the group's room.
    pub async fn send_group(
        &self,
        sender: &str,
        group_id: i64,
        body: &str,
    ) -> Result<GroupMessage, MessagingError> {
        require("sender", sender)?;
        require("message", body)?;
        validate_identity(sender)?;

        let is_member = self
            .persist("is_group_member", self.repo.is_group_member(sender, group_id))
            .await?;
        if !is_member {
            debug!(%sender, group_id, "group send rejected, not a member");
            return Err(MessagingError::NotAMember {
                username: sender.to_string(),
                group_id,
            });
        }

        let new = NewGroupMessage {
            group_id,
            sender: sender.to_string(),
            message: body.to_string(),
            timestamp: Utc::now(),
        };
        let stored = self
            .persist("create_group_message", self.repo.create_group_message(&new))
            .await?;
        let room = room_for_group(group_id);
        info!(%room, message_id = stored.id, %sender, "group message stored");

        self.fan_out(&room, ServerEvent::ReceiveGroupMessage(stored.clone()));
        Ok(stored)
    }

    // -----------------------------------------------------------------------
    // Joining and leaving
    // -----------------------------------------------------------------------

    /// Join `session` to the direct room of `sender` and `receiver`.
    pub fn join_direct(
        &self,
        session: &Arc<Session>,
        sender: &str,
        receiver: &str,
    ) -> Result<RoomId, MessagingError> {
        let room = room_for_direct(sender, receiver)?;
        self.registry.join(&room, session)?;
        Ok(room)
    }

    /// Join `session` to a group room. Not gated by durable membership;
    /// sending is.
    pub fn join_group(
        &self,
        session: &Arc<Session>,
        username: &str,
        group_id: i64,
    ) -> Result<RoomId, MessagingError> {
        validate_identity(username)?;
        let room = room_for_group(group_id);
        self.registry.join(&room, session)?;
        Ok(room)
    }

    pub fn leave_direct(
        &self,
        session: &Session,
        sender: &str,
        receiver: &str,
    ) -> Result<RoomId, MessagingError> {
        let room = room_for_direct(sender, receiver)?;
        self.registry.leave(&room, session);
        Ok(room)
    }

    pub fn leave_group(&self, session: &Session, group_id: i64) -> RoomId {
        let room = room_for_group(group_id);
        self.registry.leave(&room, session);
        room
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn persist<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, MessagingError> {
        // Dropping `call` on timeout does not roll back a write the driver has
        // already handed to the database. The row may still commit, and a
        // client that resends will store it twice.
        match tokio::time::timeout(self.persist_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "persistence call failed");
                Err(MessagingError::PersistenceFailure(format!("{operation}: {e}")))
            }
            Err(_) => {
                warn!(operation, timeout = ?self.persist_timeout, "persistence call timed out");
                Err(MessagingError::PersistenceFailure(format!(
                    "{operation} timed out after {:?}",
                    self.persist_timeout
                )))
            }
        }
    }

    fn fan_out(&self, room: &RoomId, event: ServerEvent) {
        let report = self.registry.broadcast(room, event);
        if report.dropped > 0 || !report.stale.is_empty() {
            warn!(
                %room,
                delivered = report.delivered,
                dropped = report.dropped,
                stale = report.stale.len(),
                "broadcast incomplete"
            );
        } else {
            debug!(%room, delivered = report.delivered, "broadcast complete");
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), MessagingError> {
    if value.trim().is_empty() {
        return Err(MessagingError::InvalidMessage(format!("{field} must not be empty")));
    }
    Ok(())
}
