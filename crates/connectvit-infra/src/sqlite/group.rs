//! SQLite group repository implementation.

use chrono::{DateTime, Utc};
use connectvit_core::repository::GroupRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::group::{Group, GroupListing, GroupMember, LeaveOutcome, NewGroup, UserGroup};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, stored_datetime};
use crate::error::{conflict_or_query, query_error};

/// SQLite-backed implementation of `GroupRepository`.
#[derive(Clone)]
pub struct SqliteGroupRepository {
    pool: DatabasePool,
}

impl SqliteGroupRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row types
// ---------------------------------------------------------------------------

struct GroupRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_by: String,
    created_at: String,
}

impl GroupRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_group(self) -> Result<Group, RepositoryError> {
        Ok(Group {
            id: self.id,
            name: self.name,
            description: self.description,
            created_by: self.created_by,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn group_from(row: &sqlx::sqlite::SqliteRow) -> Result<Group, RepositoryError> {
    GroupRow::from_row(row).map_err(query_error)?.into_group()
}

fn member_from(row: &sqlx::sqlite::SqliteRow) -> Result<GroupMember, RepositoryError> {
    let joined_at: String = row.try_get("joined_at").map_err(query_error)?;
    Ok(GroupMember {
        username: row.try_get("username").map_err(query_error)?,
        joined_at: parse_datetime(&joined_at)?,
        is_admin: row.try_get("is_admin").map_err(query_error)?,
        full_name: row.try_get("full_name").map_err(query_error)?,
    })
}

const MEMBER_COLUMNS: &str = r#"SELECT gm.username, gm.joined_at, gm.is_admin, u.full_name
    FROM group_members gm
    LEFT JOIN users u ON u.username = gm.username"#;

// ---------------------------------------------------------------------------
// GroupRepository impl
// ---------------------------------------------------------------------------

impl GroupRepository for SqliteGroupRepository {
    async fn is_group_member(&self, username: &str, group_id: i64) -> Result<bool, RepositoryError> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = ? AND username = ?)",
        )
        .bind(group_id)
        .bind(username)
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;
        Ok(found != 0)
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, RepositoryError> {
        let (created_at_text, created_at) = stored_datetime(&group.created_at)?;
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO groups (name, description, created_by, created_at)
               VALUES (?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(&group.name)
        .bind(&group.description)
        .bind(&group.created_by)
        .bind(&created_at_text)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO group_members (group_id, username, joined_at, is_admin)
               VALUES (?, ?, ?, 1)"#,
        )
        .bind(id)
        .bind(&group.created_by)
        .bind(&created_at_text)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(Group {
            id,
            name: group.name.clone(),
            description: group.description.clone(),
            created_by: group.created_by.clone(),
            created_at,
        })
    }

    async fn get_group(&self, group_id: i64) -> Result<Option<Group>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, description, created_by, created_at FROM groups WHERE id = ?",
        )
        .bind(group_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        row.as_ref().map(group_from).transpose()
    }

    async fn list_user_groups(&self, username: &str) -> Result<Vec<UserGroup>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT g.id, g.name, g.description, g.created_by, g.created_at, gm.is_admin
               FROM groups g
               JOIN group_members gm ON gm.group_id = g.id
               WHERE gm.username = ?
               ORDER BY g.created_at DESC, g.id DESC"#,
        )
        .bind(username)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(UserGroup {
                    group: group_from(row)?,
                    is_admin: row.try_get("is_admin").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn list_all_groups(&self) -> Result<Vec<GroupListing>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT g.id, g.name, g.description, g.created_by, g.created_at,
                      COUNT(gm.id) AS member_count
               FROM groups g
               LEFT JOIN group_members gm ON gm.group_id = g.id
               GROUP BY g.id
               ORDER BY g.created_at DESC, g.id DESC"#,
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(GroupListing {
                    group: group_from(row)?,
                    member_count: row.try_get("member_count").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn list_members(&self, group_id: i64) -> Result<Vec<GroupMember>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{MEMBER_COLUMNS} WHERE gm.group_id = ? ORDER BY gm.joined_at ASC, gm.id ASC"
        ))
        .bind(group_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter().map(member_from).collect()
    }

    async fn get_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> Result<Option<GroupMember>, RepositoryError> {
        let row = sqlx::query(&format!(
            "{MEMBER_COLUMNS} WHERE gm.group_id = ? AND gm.username = ?"
        ))
        .bind(group_id)
        .bind(username)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        row.as_ref().map(member_from).transpose()
    }

    async fn add_member(
        &self,
        group_id: i64,
        username: &str,
        is_admin: bool,
        joined_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO group_members (group_id, username, joined_at, is_admin)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(group_id)
        .bind(username)
        .bind(format_datetime(&joined_at))
        .bind(is_admin)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| conflict_or_query(e, format!("{username} is already in group {group_id}")))?;
        Ok(())
    }

    async fn count_admins(&self, group_id: i64) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = ? AND is_admin = 1")
            .bind(group_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)
    }

    async fn count_members(&self, group_id: i64) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)
    }

    async fn remove_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> Result<LeaveOutcome, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let removed = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND username = ?")
            .bind(group_id)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?
            .rows_affected();
        if removed == 0 {
            return Err(RepositoryError::NotFound);
        }

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;

        let outcome = if remaining == 0 {
            sqlx::query("DELETE FROM group_messages WHERE group_id = ?")
                .bind(group_id)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
            sqlx::query("DELETE FROM groups WHERE id = ?")
                .bind(group_id)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
            LeaveOutcome::GroupDeleted
        } else {
            LeaveOutcome::Left
        };

        tx.commit().await.map_err(query_error)?;
        Ok(outcome)
    }
}
