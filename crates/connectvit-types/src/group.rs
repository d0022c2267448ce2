//! Group and durable group-membership types.
//!
//! Durable membership is independent of any live connection: a user can be a
//! member of a group with no session joined to the group's room.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a group. The creator becomes its first admin.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A group as seen by one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    #[serde(flatten)]
    pub group: Group,
    pub is_admin: bool,
}

/// A group in the public directory, with its member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupListing {
    #[serde(flatten)]
    pub group: Group,
    pub member_count: i64,
}

/// A durable membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub username: String,
    pub joined_at: DateTime<Utc>,
    pub is_admin: bool,
    /// Display name from the users table, absent if the user row is gone.
    pub full_name: Option<String>,
}

/// Group with its member list (`GET /api/groups/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetails {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<GroupMember>,
}

/// Result of removing a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The member was removed; the group still has members.
    Left,
    /// The last member left; the group and its messages were deleted.
    GroupDeleted,
}

/// Payload for `POST /api/groups/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// The creator; becomes the first admin.
    pub username: String,
}

/// Payload for `POST /api/groups/{id}/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberRequest {
    pub username: String,
    pub added_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_group_flattens_group_fields() {
        let ug = UserGroup {
            group: Group {
                id: 5,
                name: "ml-club".to_string(),
                description: Some("papers".to_string()),
                created_by: "alice".to_string(),
                created_at: Utc::now(),
            },
            is_admin: true,
        };
        let json = serde_json::to_value(&ug).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["name"], "ml-club");
        assert_eq!(json["is_admin"], true);
    }
}
