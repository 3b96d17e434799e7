use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{IdentitySyncService, SyncError};
use crate::models::{CreateSyncLog, FullSyncReport, SyncAction};

impl IdentitySyncService {
    /// Reconcile every mapping of the organization, in creation order.
    ///
    /// A failing mapping is recorded in `errors` as `Mapping {id}: {message}`
    /// and the loop moves on. A `full_sync` summary entry is always written.
    /// Only a failure to list mappings or to write the summary is returned as
    /// an error.
    #[instrument(skip(self))]
    pub async fn sync_all(&self, org_id: Uuid) -> Result<FullSyncReport, SyncError> {
        let mappings = self
            .db
            .identity_sync_mappings()
            .list_all_by_org(org_id)
            .await?;

        let client = self.resolver.resolve(org_id).await.map_err(|e| e.to_string());
        let mut report = FullSyncReport::default();

        for mapping in &mappings {
            let result = match &client {
                Ok(client) => self.reconcile_one(client.as_ref(), mapping).await,
                Err(message) => {
                    self.record_failure(mapping, SyncError::ClientUnavailable(message.clone()))
                        .await
                }
            };

            match result {
                Ok(counts) => {
                    report.total_added += counts.added;
                    report.total_removed += counts.removed;
                }
                Err(e) => report.errors.push(format!("Mapping {}: {}", mapping.id, e)),
            }
        }

        self.audit
            .log(
                org_id,
                CreateSyncLog::success(
                    None,
                    SyncAction::FullSync,
                    json!({
                        "mappings": mappings.len(),
                        "totalAdded": report.total_added,
                        "totalRemoved": report.total_removed,
                        "errors": report.errors.len(),
                    }),
                ),
            )
            .await?;

        info!(
            mappings = mappings.len(),
            total_added = report.total_added,
            total_removed = report.total_removed,
            errors = report.errors.len(),
            "Full identity sync finished"
        );
        Ok(report)
    }
}
