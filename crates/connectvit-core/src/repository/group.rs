//! Group repository trait definition.

use chrono::{DateTime, Utc};
use connectvit_types::error::RepositoryError;
use connectvit_types::group::{Group, GroupListing, GroupMember, LeaveOutcome, NewGroup, UserGroup};

/// Repository trait for groups and their durable membership records.
pub trait GroupRepository: Send + Sync {
    /// Whether `username` holds a durable membership in `group_id`.
    fn is_group_member(
        &self,
        username: &str,
        group_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Create a group and add its creator as admin in one transaction.
    fn create_group(
        &self,
        group: &NewGroup,
    ) -> impl std::future::Future<Output = Result<Group, RepositoryError>> + Send;

    fn get_group(
        &self,
        group_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Group>, RepositoryError>> + Send;

    /// Groups `username` belongs to, with the caller's admin flag.
    fn list_user_groups(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Vec<UserGroup>, RepositoryError>> + Send;

    /// Every group with its member count.
    fn list_all_groups(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<GroupListing>, RepositoryError>> + Send;

    /// Members of a group, joined with their user's full name.
    fn list_members(
        &self,
        group_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<GroupMember>, RepositoryError>> + Send;

    fn get_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<GroupMember>, RepositoryError>> + Send;

    /// Add a membership row. A duplicate is a `RepositoryError::Conflict`.
    fn add_member(
        &self,
        group_id: i64,
        username: &str,
        is_admin: bool,
        joined_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn count_admins(
        &self,
        group_id: i64,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    fn count_members(
        &self,
        group_id: i64,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    /// Remove a membership row. When nobody is left, the group and its
    /// messages are deleted in the same transaction.
    fn remove_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> impl std::future::Future<Output = Result<LeaveOutcome, RepositoryError>> + Send;
}
