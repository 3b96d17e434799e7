use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{IdentitySyncConfigRecord, IdentitySyncConfigRepo, truncate_to_millis},
    },
    models::IdentitySyncConfig,
};

pub struct SqliteIdentitySyncConfigRepo {
    pool: SqlitePool,
}

impl SqliteIdentitySyncConfigRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_config(row: &sqlx::sqlite::SqliteRow) -> DbResult<IdentitySyncConfig> {
        Ok(IdentitySyncConfig {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            provider: row.get("provider"),
            tenant_url: row.get("tenant_url"),
            client_id: row.get("client_id"),
            client_secret_key: row.get("client_secret_key"),
            is_active: row.get::<i64, _>("is_active") != 0,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl IdentitySyncConfigRepo for SqliteIdentitySyncConfigRepo {
    async fn upsert(
        &self,
        org_id: Uuid,
        record: IdentitySyncConfigRecord,
    ) -> DbResult<IdentitySyncConfig> {
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query(
            r#"
            INSERT INTO identity_sync_configs (
                id, org_id, provider, tenant_url, client_id, client_secret_key, is_active,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (org_id, provider) DO UPDATE SET
                tenant_url = excluded.tenant_url,
                client_id = excluded.client_id,
                client_secret_key = excluded.client_secret_key,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(org_id.to_string())
        .bind(&record.provider)
        .bind(&record.tenant_url)
        .bind(&record.client_id)
        .bind(&record.client_secret_key)
        .bind(record.is_active as i64)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(org_id, &record.provider)
            .await?
            .ok_or_else(|| DbError::Internal("identity sync config vanished after upsert".into()))
    }

    async fn get(&self, org_id: Uuid, provider: &str) -> DbResult<Option<IdentitySyncConfig>> {
        let row = sqlx::query(
            r#"
            SELECT id, org_id, provider, tenant_url, client_id, client_secret_key, is_active,
                   created_at, updated_at
            FROM identity_sync_configs
            WHERE org_id = ? AND provider = ?
            "#,
        )
        .bind(org_id.to_string())
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_config).transpose()
    }

    async fn delete(&self, org_id: Uuid, provider: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM identity_sync_configs WHERE org_id = ? AND provider = ?")
                .bind(org_id.to_string())
                .bind(provider)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
