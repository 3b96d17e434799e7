use async_trait::async_trait;
use uuid::Uuid;

use super::{ListParams, ListResult};
use crate::{
    db::error::DbResult,
    models::{CreateSyncLog, SyncLog, SyncLogQuery},
};

/// Append-only store of sync log entries. There is no update or delete.
#[async_trait]
pub trait SyncLogRepo: Send + Sync {
    async fn create(&self, org_id: Uuid, input: CreateSyncLog) -> DbResult<SyncLog>;

    /// Cursor-paginated listing, newest first by default.
    async fn list(
        &self,
        org_id: Uuid,
        query: SyncLogQuery,
        params: ListParams,
    ) -> DbResult<ListResult<SyncLog>>;
}
