//! Group management service.
//!
//! Durable group membership: creating groups, adding members, leaving.
//! Live room membership is handled separately by the room registry.

use chrono::Utc;
use connectvit_types::error::{GroupError, RepositoryError};
use connectvit_types::group::{
    AddMemberRequest, CreateGroupRequest, Group, GroupDetails, GroupListing, LeaveOutcome,
    NewGroup, UserGroup,
};
use tracing::info;

use crate::repository::{GroupRepository, UserRepository};

/// Service orchestrating group membership rules.
pub struct GroupService<G: GroupRepository, U: UserRepository> {
    groups: G,
    users: U,
}

impl<G: GroupRepository, U: UserRepository> GroupService<G, U> {
    pub fn new(groups: G, users: U) -> Self {
        Self { groups, users }
    }

    /// Create a group; its creator becomes the first admin.
    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group, GroupError> {
        let name = request.name.trim();
        let created_by = request.username.trim();
        if name.is_empty() || created_by.is_empty() {
            return Err(GroupError::Validation(
                "group name and creator username are required".to_string(),
            ));
        }

        let new_group = NewGroup {
            name: name.to_string(),
            description: request.description.filter(|d| !d.trim().is_empty()),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        let group = self.groups.create_group(&new_group).await.map_err(storage)?;
        info!(group_id = group.id, %created_by, "group created");
        Ok(group)
    }

    pub async fn details(&self, group_id: i64) -> Result<GroupDetails, GroupError> {
        let group = self
            .groups
            .get_group(group_id)
            .await
            .map_err(storage)?
            .ok_or(GroupError::NotFound)?;
        let members = self.groups.list_members(group_id).await.map_err(storage)?;
        Ok(GroupDetails { group, members })
    }

    pub async fn user_groups(&self, username: &str) -> Result<Vec<UserGroup>, GroupError> {
        self.groups.list_user_groups(username).await.map_err(storage)
    }

    pub async fn all_groups(&self) -> Result<Vec<GroupListing>, GroupError> {
        self.groups.list_all_groups().await.map_err(storage)
    }

    /// Add a member. Anyone may add themselves; adding someone else takes an admin.
    pub async fn add_member(
        &self,
        group_id: i64,
        request: AddMemberRequest,
    ) -> Result<(), GroupError> {
        let username = request.username.trim();
        let added_by = request.added_by.trim();
        if username.is_empty() || added_by.is_empty() {
            return Err(GroupError::Validation(
                "username and added_by are required".to_string(),
            ));
        }

        self.groups
            .get_group(group_id)
            .await
            .map_err(storage)?
            .ok_or(GroupError::NotFound)?;

        if username != added_by {
            let adder = self
                .groups
                .get_member(group_id, added_by)
                .await
                .map_err(storage)?;
            if !adder.is_some_and(|m| m.is_admin) {
                return Err(GroupError::NotAdmin);
            }
        }

        self.users
            .get_user_by_username(username)
            .await
            .map_err(storage)?
            .ok_or(GroupError::UserNotFound)?;

        self.groups
            .add_member(group_id, username, false, Utc::now())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => GroupError::AlreadyMember,
                other => storage(other),
            })?;
        info!(group_id, %username, %added_by, "member added");
        Ok(())
    }

    /// Remove `username` from the group.
    ///
    /// The only admin cannot leave while others remain. When the last member
    /// leaves, the group and its messages are deleted.
    pub async fn leave(&self, group_id: i64, username: &str) -> Result<LeaveOutcome, GroupError> {
        if username.trim().is_empty() {
            return Err(GroupError::Validation("username is required".to_string()));
        }
        let member = self
            .groups
            .get_member(group_id, username)
            .await
            .map_err(storage)?
            .ok_or(GroupError::NotAMember)?;

        if member.is_admin {
            let admins = self.groups.count_admins(group_id).await.map_err(storage)?;
            let members = self.groups.count_members(group_id).await.map_err(storage)?;
            if admins == 1 && members > 1 {
                return Err(GroupError::LastAdmin);
            }
        }

        let outcome = self
            .groups
            .remove_member(group_id, username)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => GroupError::NotAMember,
                other => storage(other),
            })?;
        info!(group_id, %username, ?outcome, "member left group");
        Ok(outcome)
    }
}

fn storage(e: RepositoryError) -> GroupError {
    GroupError::StorageError(e.to_string())
}
