use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::DbResult,
        repos::{GroupRepo, truncate_to_millis},
    },
    models::{CreateGroup, Group},
};

pub struct SqliteGroupRepo {
    pool: SqlitePool,
}

impl SqliteGroupRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepo for SqliteGroupRepo {
    async fn create(&self, org_id: Uuid, input: CreateGroup) -> DbResult<Group> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query("INSERT INTO groups (id, org_id, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(org_id.to_string())
            .bind(&input.name)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(Group {
            id,
            org_id,
            name: input.name,
            created_at: now,
        })
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<Group>> {
        let row =
            sqlx::query("SELECT id, org_id, name, created_at FROM groups WHERE id = ? AND org_id = ?")
                .bind(id.to_string())
                .bind(org_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(Group {
                id: parse_uuid(&row.get::<String, _>("id"))?,
                org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
                name: row.get("name"),
                created_at: row.get("created_at"),
            })),
            None => Ok(None),
        }
    }

    async fn list_member_ids(&self, group_id: Uuid) -> DbResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT user_id FROM group_members WHERE group_id = ? ORDER BY user_id")
            .bind(group_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| parse_uuid(&row.get::<String, _>("user_id")))
            .collect()
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO group_members (group_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(group_id.to_string())
        .bind(user_id.to_string())
        .bind(truncate_to_millis(chrono::Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
