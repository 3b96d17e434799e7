use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::{
    db::{DbPool, DbResult, ListParams, ListResult},
    models::{CreateSyncLog, SyncLog, SyncLogQuery},
};

/// Audit logger for identity sync.
///
/// Each call is one synchronous write. Failures propagate to the caller;
/// nothing is buffered or retried.
#[derive(Clone)]
pub struct SyncLogService {
    db: Arc<DbPool>,
}

impl SyncLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn log(&self, org_id: Uuid, entry: CreateSyncLog) -> DbResult<SyncLog> {
        debug!(
            %org_id,
            mapping_id = ?entry.mapping_id,
            action = %entry.action,
            status = entry.status.as_str(),
            "Recording sync log entry"
        );
        self.db.sync_logs().create(org_id, entry).await
    }

    /// Newest first, optionally restricted to one mapping.
    pub async fn list(
        &self,
        org_id: Uuid,
        query: SyncLogQuery,
        params: ListParams,
    ) -> DbResult<ListResult<SyncLog>> {
        self.db.sync_logs().list(org_id, query, params).await
    }
}
