use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{map_unique_violation, parse_enum, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{
            Cursor, IdentitySyncMappingRepo, ListParams, ListResult, PageCursors, truncate_to_millis,
        },
    },
    models::{CreateIdentitySyncMapping, IdentitySyncMapping},
};

const COLUMNS: &str = "id, org_id, external_group_id, external_group_name, target_type, target_id, \
                       role_name, sync_direction, last_sync_at, created_at, updated_at";

pub struct SqliteIdentitySyncMappingRepo {
    pool: SqlitePool,
}

impl SqliteIdentitySyncMappingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_mapping(row: &sqlx::sqlite::SqliteRow) -> DbResult<IdentitySyncMapping> {
        Ok(IdentitySyncMapping {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            external_group_id: row.get("external_group_id"),
            external_group_name: row.get("external_group_name"),
            target_type: parse_enum("target_type", &row.get::<String, _>("target_type"))?,
            target_id: row.get("target_id"),
            role_name: row.get("role_name"),
            sync_direction: parse_enum("sync_direction", &row.get::<String, _>("sync_direction"))?,
            last_sync_at: row.get("last_sync_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl IdentitySyncMappingRepo for SqliteIdentitySyncMappingRepo {
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateIdentitySyncMapping,
    ) -> DbResult<IdentitySyncMapping> {
        let id = Uuid::now_v7();
        let now = truncate_to_millis(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO identity_sync_mappings (
                id, org_id, external_group_id, external_group_name, target_type, target_id,
                role_name, sync_direction, last_sync_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(org_id.to_string())
        .bind(&input.external_group_id)
        .bind(&input.external_group_name)
        .bind(input.target_type.as_str())
        .bind(&input.target_id)
        .bind(&input.role_name)
        .bind(input.sync_direction.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                format!(
                    "External group '{}' is already mapped to {} '{}'",
                    input.external_group_id, input.target_type, input.target_id
                )
            })
        })?;

        Ok(IdentitySyncMapping {
            id,
            org_id,
            external_group_id: input.external_group_id,
            external_group_name: input.external_group_name,
            target_type: input.target_type,
            target_id: input.target_id,
            role_name: input.role_name,
            sync_direction: input.sync_direction,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<IdentitySyncMapping>> {
        let query = format!(
            "SELECT {} FROM identity_sync_mappings WHERE id = ? AND org_id = ?",
            COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(org_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_mapping).transpose()
    }

    async fn list_by_org(
        &self,
        org_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<IdentitySyncMapping>> {
        let limit = params.limit.unwrap_or(100);
        let fetch_limit = limit + 1;

        let (comparison, order, should_reverse) = match params.cursor {
            Some(_) => params.sort_order.cursor_query_params(params.direction),
            None => ("", params.sort_order.as_sql(), false),
        };
        let cursor_filter = if params.cursor.is_some() {
            format!("AND (created_at, id) {} (?, ?)", comparison)
        } else {
            String::new()
        };

        let query = format!(
            r#"
            SELECT {}
            FROM identity_sync_mappings
            WHERE org_id = ? {}
            ORDER BY created_at {}, id {}
            LIMIT ?
            "#,
            COLUMNS, cursor_filter, order, order
        );

        let mut query_builder = sqlx::query(&query).bind(org_id.to_string());
        if let Some(cursor) = &params.cursor {
            query_builder = query_builder
                .bind(cursor.created_at)
                .bind(cursor.id.to_string());
        }

        let rows = query_builder
            .bind(fetch_limit)
            .fetch_all(&self.pool)
            .await?;

        let has_more = rows.len() as i64 > limit;
        let mut items = rows
            .iter()
            .take(limit as usize)
            .map(Self::parse_mapping)
            .collect::<DbResult<Vec<_>>>()?;

        if should_reverse {
            items.reverse();
        }

        let cursors = PageCursors::from_items(
            &items,
            has_more,
            params.direction,
            params.cursor.as_ref(),
            |m| Cursor::new(m.created_at, m.id),
        );

        Ok(ListResult::new(items, has_more, cursors))
    }

    async fn list_all_by_org(&self, org_id: Uuid) -> DbResult<Vec<IdentitySyncMapping>> {
        let query = format!(
            "SELECT {} FROM identity_sync_mappings WHERE org_id = ? ORDER BY created_at ASC, id ASC",
            COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(org_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_mapping).collect()
    }

    async fn list_by_external_group(
        &self,
        org_id: Uuid,
        external_group_id: &str,
    ) -> DbResult<Vec<IdentitySyncMapping>> {
        let query = format!(
            r#"
            SELECT {}
            FROM identity_sync_mappings
            WHERE org_id = ? AND external_group_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
            COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(org_id.to_string())
            .bind(external_group_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_mapping).collect()
    }

    async fn mark_synced(&self, org_id: Uuid, id: Uuid, at: DateTime<Utc>) -> DbResult<()> {
        let at = truncate_to_millis(at);
        let result = sqlx::query(
            r#"
            UPDATE identity_sync_mappings
            SET last_sync_at = ?, updated_at = ?
            WHERE id = ? AND org_id = ?
            "#,
        )
        .bind(at)
        .bind(at)
        .bind(id.to_string())
        .bind(org_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, org_id: Uuid, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM identity_sync_mappings WHERE id = ? AND org_id = ?")
            .bind(id.to_string())
            .bind(org_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
