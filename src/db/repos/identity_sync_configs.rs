use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::error::DbResult, models::IdentitySyncConfig};

/// Row-level fields written by [`IdentitySyncConfigRepo::upsert`].
#[derive(Debug, Clone)]
pub struct IdentitySyncConfigRecord {
    pub provider: String,
    pub tenant_url: String,
    pub client_id: String,
    pub client_secret_key: Option<String>,
    pub is_active: bool,
}

#[async_trait]
pub trait IdentitySyncConfigRepo: Send + Sync {
    /// Insert or replace the config for `(org_id, record.provider)`.
    async fn upsert(
        &self,
        org_id: Uuid,
        record: IdentitySyncConfigRecord,
    ) -> DbResult<IdentitySyncConfig>;

    async fn get(&self, org_id: Uuid, provider: &str) -> DbResult<Option<IdentitySyncConfig>>;

    /// Fails with `NotFound` if nothing was stored.
    async fn delete(&self, org_id: Uuid, provider: &str) -> DbResult<()>;
}
