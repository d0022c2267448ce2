//! Message history and the per-user chat list.

use connectvit_types::error::{MessagingError, RepositoryError};
use connectvit_types::message::{ChatMessage, ChatSummary, DirectMessage, GroupMessage};

use crate::realtime::{room_for_direct, room_for_group};
use crate::repository::{GroupRepository, MessageRepository};

/// Placeholder shown for a group nobody has written in yet.
pub const NO_MESSAGES_YET: &str = "No messages yet";

/// Read-side service over persisted messages.
pub struct HistoryService<M: MessageRepository, G: GroupRepository> {
    messages: M,
    groups: G,
}

impl<M: MessageRepository, G: GroupRepository> HistoryService<M, G> {
    pub fn new(messages: M, groups: G) -> Self {
        Self { messages, groups }
    }

    /// Both directions of a conversation, oldest first.
    pub async fn direct_messages(
        &self,
        sender: &str,
        receiver: &str,
    ) -> Result<Vec<DirectMessage>, MessagingError> {
        if sender.is_empty() || receiver.is_empty() {
            return Err(MessagingError::InvalidMessage(
                "sender and receiver are required".to_string(),
            ));
        }
        self.messages
            .get_messages_between(sender, receiver)
            .await
            .map_err(storage)
    }

    pub async fn group_messages(&self, group_id: i64) -> Result<Vec<GroupMessage>, MessagingError> {
        self.messages.get_group_messages(group_id).await.map_err(storage)
    }

    /// One entry per direct conversation and per group of `username`,
    /// most recently active first.
    pub async fn chat_history(&self, username: &str) -> Result<Vec<ChatSummary>, MessagingError> {
        if username.is_empty() {
            return Err(MessagingError::InvalidMessage("username is required".to_string()));
        }
        let mut history = Vec::new();

        let participants = self
            .messages
            .get_conversation_participants(username)
            .await
            .map_err(storage)?;
        for participant in participants {
            // Rows written before identity validation may not address cleanly.
            let Ok(room) = room_for_direct(username, &participant) else {
                continue;
            };
            let recent = self
                .messages
                .get_recent_message(&room)
                .await
                .map_err(storage)?;
            if let Some(ChatMessage::Direct(m)) = recent {
                history.push(ChatSummary::Direct {
                    participants: [username.to_string(), participant],
                    last_message: m.message,
                    timestamp: m.timestamp,
                });
            }
        }

        let groups = self.groups.list_user_groups(username).await.map_err(storage)?;
        for membership in groups {
            let group = membership.group;
            let recent = self
                .messages
                .get_recent_message(&room_for_group(group.id))
                .await
                .map_err(storage)?;
            history.push(match recent {
                Some(ChatMessage::Group(m)) => ChatSummary::Group {
                    group_id: group.id,
                    group_name: group.name,
                    last_message: m.message,
                    sender: m.sender,
                    timestamp: m.timestamp,
                },
                _ => ChatSummary::Group {
                    group_id: group.id,
                    group_name: group.name,
                    last_message: NO_MESSAGES_YET.to_string(),
                    sender: String::new(),
                    timestamp: group.created_at,
                },
            });
        }

        history.sort_by(|x, y| y.timestamp().cmp(&x.timestamp()));
        Ok(history)
    }
}

fn storage(e: RepositoryError) -> MessagingError {
    MessagingError::PersistenceFailure(e.to_string())
}
