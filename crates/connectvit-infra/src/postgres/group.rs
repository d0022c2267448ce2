//! PostgreSQL group repository implementation.

use chrono::{DateTime, Utc};
use connectvit_core::repository::GroupRepository;
use connectvit_types::error::RepositoryError;
use connectvit_types::group::{Group, GroupListing, GroupMember, LeaveOutcome, NewGroup, UserGroup};
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::pool::PgDatabasePool;
use super::stored_datetime;
use crate::error::{conflict_or_query, query_error};

#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgDatabasePool,
}

impl PgGroupRepository {
    pub fn new(pool: PgDatabasePool) -> Self {
        Self { pool }
    }
}

fn group_from(row: &PgRow) -> Result<Group, sqlx::Error> {
    Ok(Group {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn member_from(row: &PgRow) -> Result<GroupMember, sqlx::Error> {
    Ok(GroupMember {
        username: row.try_get("username")?,
        joined_at: row.try_get("joined_at")?,
        is_admin: row.try_get("is_admin")?,
        full_name: row.try_get("full_name")?,
    })
}

const MEMBER_COLUMNS: &str = r#"SELECT gm.username, gm.joined_at, gm.is_admin, u.full_name
    FROM group_members gm
    LEFT JOIN users u ON u.username = gm.username"#;

impl GroupRepository for PgGroupRepository {
    async fn is_group_member(&self, username: &str, group_id: i64) -> Result<bool, RepositoryError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = $1 AND username = $2)",
        )
        .bind(group_id)
        .bind(username)
        .fetch_one(&self.pool.pool)
        .await
        .map_err(query_error)
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, RepositoryError> {
        let created_at = stored_datetime(&group.created_at);
        let mut tx = self.pool.pool.begin().await.map_err(query_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO groups (name, description, created_by, created_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(&group.name)
        .bind(&group.description)
        .bind(&group.created_by)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO group_members (group_id, username, joined_at, is_admin)
               VALUES ($1, $2, $3, TRUE)"#,
        )
        .bind(id)
        .bind(&group.created_by)
        .bind(created_at)
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
            "SELECT id, name, description, created_by, created_at FROM groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(group_from).transpose().map_err(query_error)
    }

    async fn list_user_groups(&self, username: &str) -> Result<Vec<UserGroup>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT g.id, g.name, g.description, g.created_by, g.created_at, gm.is_admin
               FROM groups g
               JOIN group_members gm ON gm.group_id = g.id
               WHERE gm.username = $1
               ORDER BY g.created_at DESC, g.id DESC"#,
        )
        .bind(username)
        .fetch_all(&self.pool.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(UserGroup {
                    group: group_from(row)?,
                    is_admin: row.try_get("is_admin")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(query_error)
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
        .fetch_all(&self.pool.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(GroupListing {
                    group: group_from(row)?,
                    member_count: row.try_get("member_count")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(query_error)
    }

    async fn list_members(&self, group_id: i64) -> Result<Vec<GroupMember>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{MEMBER_COLUMNS} WHERE gm.group_id = $1 ORDER BY gm.joined_at ASC, gm.id ASC"
        ))
        .bind(group_id)
        .fetch_all(&self.pool.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(member_from)
            .collect::<Result<_, _>>()
            .map_err(query_error)
    }

    async fn get_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> Result<Option<GroupMember>, RepositoryError> {
        let row = sqlx::query(&format!(
            "{MEMBER_COLUMNS} WHERE gm.group_id = $1 AND gm.username = $2"
        ))
        .bind(group_id)
        .bind(username)
        .fetch_optional(&self.pool.pool)
        .await
        .map_err(query_error)?;

        row.as_ref().map(member_from).transpose().map_err(query_error)
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
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(group_id)
        .bind(username)
        .bind(joined_at)
        .bind(is_admin)
        .execute(&self.pool.pool)
        .await
        .map_err(|e| conflict_or_query(e, format!("{username} is already in group {group_id}")))?;
        Ok(())
    }

    async fn count_admins(&self, group_id: i64) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND is_admin")
            .bind(group_id)
            .fetch_one(&self.pool.pool)
            .await
            .map_err(query_error)
    }

    async fn count_members(&self, group_id: i64) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool.pool)
            .await
            .map_err(query_error)
    }

    async fn remove_member(
        &self,
        group_id: i64,
        username: &str,
    ) -> Result<LeaveOutcome, RepositoryError> {
        let mut tx = self.pool.pool.begin().await.map_err(query_error)?;

        let removed = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND username = $2")
            .bind(group_id)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?
            .rows_affected();
        if removed == 0 {
            return Err(RepositoryError::NotFound);
        }

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(query_error)?;

        let outcome = if remaining == 0 {
            // group_messages cascade with the group row.
            sqlx::query("DELETE FROM groups WHERE id = $1")
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

#[cfg(test)]
mod tests {
    use super::*;

    use crate::postgres::test_pool;

    #[tokio::test]
    async fn membership_lifecycle() {
        let Some((_guard, pool)) = test_pool().await else {
            return;
        };
        let repo = PgGroupRepository::new(pool);
        let group = repo
            .create_group(&NewGroup {
                name: "dsa".to_string(),
                description: None,
                created_by: "alice".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(repo.get_group(group.id).await.unwrap(), Some(group.clone()));
        assert!(repo.is_group_member("alice", group.id).await.unwrap());
        repo.add_member(group.id, "bob", false, Utc::now()).await.unwrap();
        assert!(matches!(
            repo.add_member(group.id, "bob", false, Utc::now()).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(repo.count_admins(group.id).await.unwrap(), 1);
        assert_eq!(repo.list_all_groups().await.unwrap()[0].member_count, 2);

        assert_eq!(
            repo.remove_member(group.id, "bob").await.unwrap(),
            LeaveOutcome::Left
        );
        assert_eq!(
            repo.remove_member(group.id, "alice").await.unwrap(),
            LeaveOutcome::GroupDeleted
        );
        assert!(repo.get_group(group.id).await.unwrap().is_none());
    }
}
