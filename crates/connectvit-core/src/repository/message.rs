//! Message repository trait definition.

use connectvit_types::error::RepositoryError;
use connectvit_types::message::{
    ChatMessage, DirectMessage, GroupMessage, NewDirectMessage, NewGroupMessage,
};
use connectvit_types::room::RoomId;

/// Repository trait for direct and group message persistence.
///
/// Implementations live in connectvit-infra (SQLite and PostgreSQL).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait MessageRepository: Send + Sync {
    /// Durably store a direct message. The returned row carries the
    /// storage-assigned id.
    fn create_message(
        &self,
        message: &NewDirectMessage,
    ) -> impl std::future::Future<Output = Result<DirectMessage, RepositoryError>> + Send;

    /// Durably store a group message.
    fn create_group_message(
        &self,
        message: &NewGroupMessage,
    ) -> impl std::future::Future<Output = Result<GroupMessage, RepositoryError>> + Send;

    /// Both directions of the conversation between `a` and `b`, oldest first.
    fn get_messages_between(
        &self,
        a: &str,
        b: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DirectMessage>, RepositoryError>> + Send;

    /// All messages of a group, oldest first.
    fn get_group_messages(
        &self,
        group_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<GroupMessage>, RepositoryError>> + Send;

    /// Every identity `username` has exchanged a direct message with.
    fn get_conversation_participants(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;

    /// The most recent message in a room, if any.
    ///
    /// `room` must be a canonical id; anything else is a `Query` error.
    fn get_recent_message(
        &self,
        room: &RoomId,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;
}
