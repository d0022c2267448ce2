//! In-memory repository used by the core test suites.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use connectvit_types::error::RepositoryError;
use connectvit_types::group::{Group, GroupListing, GroupMember, LeaveOutcome, NewGroup, UserGroup};
use connectvit_types::message::{
    ChatMessage, DirectMessage, GroupMessage, NewDirectMessage, NewGroupMessage,
};
use connectvit_types::post::{LikeAction, NewPost, Post};
use connectvit_types::room::{Room, RoomId};
use connectvit_types::user::{NewUser, User};

use crate::realtime::parse_room;
use crate::repository::{GroupRepository, MessageRepository, PostRepository, UserRepository};

#[derive(Default)]
struct State {
    next_id: i64,
    direct: Vec<DirectMessage>,
    group_messages: Vec<GroupMessage>,
    groups: BTreeMap<i64, Group>,
    members: BTreeMap<(i64, String), GroupMember>,
    users: Vec<User>,
    bios: HashMap<String, String>,
    posts: Vec<Post>,
    likes: BTreeMap<i64, BTreeSet<String>>,
    fail_writes: bool,
    fail_reads: bool,
    delay: Option<Duration>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Cloneable in-memory store; clones share state.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub(crate) fn with_member(self, username: &str, group_id: i64) -> Self {
        {
            let mut s = self.lock();
            s.groups.entry(group_id).or_insert_with(|| Group {
                id: group_id,
                name: format!("group-{group_id}"),
                description: None,
                created_by: username.to_string(),
                created_at: Utc::now(),
            });
            s.members.insert(
                (group_id, username.to_string()),
                GroupMember {
                    username: username.to_string(),
                    joined_at: Utc::now(),
                    is_admin: false,
                    full_name: None,
                },
            );
        }
        self
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub(crate) fn direct_count(&self) -> usize {
        self.lock().direct.len()
    }

    pub(crate) fn group_count(&self) -> usize {
        self.lock().group_messages.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn read(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.pause().await;
        let s = self.lock();
        if s.fail_reads {
            return Err(RepositoryError::Query("read failed".to_string()));
        }
        Ok(s)
    }

    async fn write(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.pause().await;
        let s = self.lock();
        if s.fail_writes {
            return Err(RepositoryError::Query("disk full".to_string()));
        }
        Ok(s)
    }
}

impl MessageRepository for MemoryStore {
    async fn create_message(
        &self,
        message: &NewDirectMessage,
    ) -> Result<DirectMessage, RepositoryError> {
        let mut s = self.write().await?;
        let stored = DirectMessage {
            id: s.next_id(),
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            message: message.message.clone(),
            timestamp: message.timestamp,
        };
        s.direct.push(stored.clone());
        Ok(stored)
    }

    async fn create_group_message(
        &self,
        message: &NewGroupMessage,
    ) -> Result<GroupMessage, RepositoryError> {
        let mut s = self.write().await?;
        let stored = GroupMessage {
            id: s.next_id(),
            group_id: message.group_id,
            sender: message.sender.clone(),
            message: message.message.clone(),
            timestamp: message.timestamp,
        };
        s.group_messages.push(stored.clone());
        Ok(stored)
    }

    async fn get_messages_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let s = self.read().await?;
        let mut out: Vec<DirectMessage> = s
            .direct
            .iter()
            .filter(|m| {
                (m.sender == a && m.receiver == b) || (m.sender == b && m.receiver == a)
            })
            .cloned()
            .collect();
        out.sort_by_key(|m| (m.timestamp, m.id));
        Ok(out)
    }

    async fn get_group_messages(&self, group_id: i64) -> Result<Vec<GroupMessage>, RepositoryError> {
        let s = self.read().await?;
        let mut out: Vec<GroupMessage> = s
            .group_messages
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        out.sort_by_key(|m| (m.timestamp, m.id));
        Ok(out)
    }

    async fn get_conversation_participants(
        &self,
        username: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        let s = self.read().await?;
        let set: BTreeSet<String> = s
            .direct
            .iter()
            .filter_map(|m| {
                if m.sender == username {
                    Some(m.receiver.clone())
                } else if m.receiver == username {
                    Some(m.sender.clone())
                } else {
                    None
                }
            })
            .collect();
        Ok(set.into_iter().collect())
    }

    async fn get_recent_message(
        &self,
        room: &RoomId,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let room = parse_room(room).map_err(|e| RepositoryError::Query(e.to_string()))?;
        let s = self.read().await?;
        let recent = match &room {
            Room::Direct { a, b } => s
                .direct
                .iter()
                .filter(|m| {
                    (&m.sender == a && &m.receiver == b) || (&m.sender == b && &m.receiver == a)
                })
                .max_by_key(|m| (m.timestamp, m.id))
                .cloned()
                .map(ChatMessage::Direct),
            Room::Group { group_id } => s
                .group_messages
                .iter()
                .filter(|m| m.group_id == *group_id)
                .max_by_key(|m| (m.timestamp, m.id))
                .cloned()
                .map(ChatMessage::Group),
        };
        Ok(recent)
    }
}

impl GroupRepository for MemoryStore {
    async fn is_group_member(&self, username: &str, group_id: i64) -> Result<bool, RepositoryError> {
        let s = self.read().await?;
        Ok(s.members.contains_key(&(group_id, username.to_string())))
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, RepositoryError> {
        let mut s = self.write().await?;
        let created = Group {
            id: s.next_id(),
            name: group.name.clone(),
            description: group.description.clone(),
            created_by: group.created_by.clone(),
            created_at: group.created_at,
        };
        s.groups.insert(created.id, created.clone());
        s.members.insert(
            (created.id, group.created_by.clone()),
            GroupMember {
                username: group.created_by.clone(),
                joined_at: group.created_at,
                is_admin: true,
                full_name: None,
            },
        );
        Ok(created)
    }

    async fn get_group(&self, group_id: i64) -> Result<Option<Group>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.groups.get(&group_id).cloned())
    }

    async fn list_user_groups(&self, username: &str) -> Result<Vec<UserGroup>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.members
            .iter()
            .filter(|((_, name), _)| name == username)
            .filter_map(|((group_id, _), member)| {
                s.groups.get(group_id).map(|g| UserGroup {
                    group: g.clone(),
                    is_admin: member.is_admin,
                })
            })
            .collect())
    }

    async fn list_all_groups(&self) -> Result<Vec<GroupListing>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.groups
            .values()
            .map(|g| GroupListing {
                group: g.clone(),
                member_count: s.members.keys().filter(|(id, _)| *id == g.id).count() as i64,
            })
            .collect())
    }

    async fn list_members(&self, group_id: i64) -> Result<Vec<GroupMember>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.members
            .iter()
            .filter(|((id, _), _)| *id == group_id)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn get_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> Result<Option<GroupMember>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.members.get(&(group_id, username.to_string())).cloned())
    }

    async fn add_member(
        &self,
        group_id: i64,
        username: &str,
        is_admin: bool,
        joined_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut s = self.write().await?;
        let key = (group_id, username.to_string());
        if s.members.contains_key(&key) {
            return Err(RepositoryError::Conflict(format!(
                "{username} already in group {group_id}"
            )));
        }
        s.members.insert(
            key,
            GroupMember {
                username: username.to_string(),
                joined_at,
                is_admin,
                full_name: None,
            },
        );
        Ok(())
    }

    async fn count_admins(&self, group_id: i64) -> Result<i64, RepositoryError> {
        let s = self.read().await?;
        Ok(s.members
            .iter()
            .filter(|((id, _), m)| *id == group_id && m.is_admin)
            .count() as i64)
    }

    async fn count_members(&self, group_id: i64) -> Result<i64, RepositoryError> {
        let s = self.read().await?;
        Ok(s.members.keys().filter(|(id, _)| *id == group_id).count() as i64)
    }

    async fn remove_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> Result<LeaveOutcome, RepositoryError> {
        let mut s = self.write().await?;
        if s.members.remove(&(group_id, username.to_string())).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if s.members.keys().any(|(id, _)| *id == group_id) {
            return Ok(LeaveOutcome::Left);
        }
        s.group_messages.retain(|m| m.group_id != group_id);
        s.groups.remove(&group_id);
        Ok(LeaveOutcome::GroupDeleted)
    }
}

impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut s = self.write().await?;
        if s
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RepositoryError::Conflict("users.username".to_string()));
        }
        let created = User {
            id: s.next_id(),
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            date_of_joining: user.date_of_joining.clone(),
        };
        s.users.push(created.clone());
        Ok(created)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.users.clone())
    }

    async fn get_bio(&self, username: &str) -> Result<Option<String>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.bios.get(username).cloned())
    }

    async fn upsert_bio(
        &self,
        username: &str,
        bio: &str,
        _updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut s = self.write().await?;
        s.bios.insert(username.to_string(), bio.to_string());
        Ok(())
    }
}

impl PostRepository for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let s = self.read().await?;
        let mut posts: Vec<Post> = s
            .posts
            .iter()
            .map(|p| Post {
                likes: s
                    .likes
                    .get(&p.id)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default(),
                ..p.clone()
            })
            .collect();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let mut s = self.write().await?;
        let created = Post {
            id: s.next_id(),
            username: post.username.clone(),
            caption: post.caption.clone(),
            image_url: post.image_url.clone(),
            timestamp: post.timestamp,
            likes: Vec::new(),
        };
        s.posts.push(created.clone());
        Ok(created)
    }

    async fn post_exists(&self, post_id: i64) -> Result<bool, RepositoryError> {
        let s = self.read().await?;
        Ok(s.posts.iter().any(|p| p.id == post_id))
    }

    async fn toggle_like(
        &self,
        post_id: i64,
        username: &str,
        _at: DateTime<Utc>,
    ) -> Result<LikeAction, RepositoryError> {
        let mut s = self.write().await?;
        let likers = s.likes.entry(post_id).or_default();
        if likers.remove(username) {
            Ok(LikeAction::Unliked)
        } else {
            likers.insert(username.to_string());
            Ok(LikeAction::Liked)
        }
    }

    async fn get_likes(&self, post_id: i64) -> Result<Vec<String>, RepositoryError> {
        let s = self.read().await?;
        Ok(s.likes
            .get(&post_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }
}
