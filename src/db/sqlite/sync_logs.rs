use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::DbResult,
        repos::{Cursor, ListParams, ListResult, PageCursors, SyncLogRepo, truncate_to_millis},
    },
    models::{CreateSyncLog, SyncLog, SyncLogQuery},
};

pub struct SqliteSyncLogRepo {
    pool: SqlitePool,
}

impl SqliteSyncLogRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_log(row: &sqlx::sqlite::SqliteRow) -> DbResult<SyncLog> {
        let mapping_id: Option<String> = row.get("mapping_id");
        let details: String = row.get("details");

        Ok(SyncLog {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            mapping_id: mapping_id.map(|s| parse_uuid(&s)).transpose()?,
            action: parse_enum("action", &row.get::<String, _>("action"))?,
            details: serde_json::from_str(&details)?,
            status: parse_enum("status", &row.get::<String, _>("status"))?,
            error: row.get("error"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl SyncLogRepo for SqliteSyncLogRepo {
    async fn create(&self, org_id: Uuid, input: CreateSyncLog) -> DbResult<SyncLog> {
        let id = Uuid::now_v7();
        let now = truncate_to_millis(chrono::Utc::now());
        let details = serde_json::to_string(&input.details)?;

        sqlx::query(
            r#"
            INSERT INTO identity_sync_logs (id, org_id, mapping_id, action, details, status, error, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(org_id.to_string())
        .bind(input.mapping_id.map(|id| id.to_string()))
        .bind(input.action.as_str())
        .bind(&details)
        .bind(input.status.as_str())
        .bind(&input.error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(SyncLog {
            id,
            org_id,
            mapping_id: input.mapping_id,
            action: input.action,
            details: input.details,
            status: input.status,
            error: input.error,
            created_at: now,
        })
    }

    async fn list(
        &self,
        org_id: Uuid,
        query: SyncLogQuery,
        params: ListParams,
    ) -> DbResult<ListResult<SyncLog>> {
        let limit = params.limit.unwrap_or(100);
        let fetch_limit = limit + 1;

        let (comparison, order, should_reverse) = match params.cursor {
            Some(_) => params.sort_order.cursor_query_params(params.direction),
            None => ("", params.sort_order.as_sql(), false),
        };

        let mut conditions = vec!["org_id = ?".to_string()];
        if query.mapping_id.is_some() {
            conditions.push("mapping_id = ?".to_string());
        }
        if params.cursor.is_some() {
            conditions.push(format!("(created_at, id) {} (?, ?)", comparison));
        }

        let sql = format!(
            r#"
            SELECT id, org_id, mapping_id, action, details, status, error, created_at
            FROM identity_sync_logs
            WHERE {}
            ORDER BY created_at {}, id {}
            LIMIT ?
            "#,
            conditions.join(" AND "),
            order,
            order
        );

        let mut query_builder = sqlx::query(&sql).bind(org_id.to_string());
        if let Some(mapping_id) = query.mapping_id {
            query_builder = query_builder.bind(mapping_id.to_string());
        }
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
            .map(Self::parse_log)
            .collect::<DbResult<Vec<_>>>()?;

        if should_reverse {
            items.reverse();
        }

        let cursors = PageCursors::from_items(
            &items,
            has_more,
            params.direction,
            params.cursor.as_ref(),
            |log| Cursor::new(log.created_at, log.id),
        );

        Ok(ListResult::new(items, has_more, cursors))
    }
}
