//! Scheduled full identity sync over every organization.

use std::{sync::Arc, time::Instant};

use crate::{config::ScheduleConfig, db::DbPool, services::IdentitySyncService};

/// Results from a single pass over all organizations.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncPassResult {
    pub organizations: usize,
    /// Organizations whose sync returned an error (e.g. the summary write failed)
    pub organizations_failed: usize,
    /// Mappings that failed, summed over every organization
    pub mapping_errors: usize,
    pub total_added: usize,
    pub total_removed: usize,
    pub duration_ms: u64,
}

/// Starts the scheduled sync worker. The first pass runs after one interval.
///
/// Runs until the task is cancelled.
pub async fn start_identity_sync_worker(
    db: Arc<DbPool>,
    sync: IdentitySyncService,
    config: ScheduleConfig,
) {
    if !config.enabled {
        tracing::info!("Scheduled identity sync disabled by configuration");
        return;
    }

    tracing::info!(
        interval_secs = config.interval_secs,
        "Starting scheduled identity sync worker"
    );

    let interval = config.interval();
    loop {
        tokio::time::sleep(interval).await;

        match run_sync_pass(&db, &sync).await {
            Ok(result) => tracing::info!(
                organizations = result.organizations,
                organizations_failed = result.organizations_failed,
                mapping_errors = result.mapping_errors,
                total_added = result.total_added,
                total_removed = result.total_removed,
                duration_ms = result.duration_ms,
                "Scheduled identity sync pass complete"
            ),
            Err(e) => tracing::error!(error = %e, "Error listing organizations for identity sync"),
        }
    }
}

/// Sync every organization once. One organization's failure does not stop
/// the others.
pub async fn run_sync_pass(
    db: &DbPool,
    sync: &IdentitySyncService,
) -> crate::db::DbResult<SyncPassResult> {
    let start = Instant::now();
    let mut result = SyncPassResult::default();

    for org in db.organizations().list_all().await? {
        result.organizations += 1;
        match sync.sync_all(org.id).await {
            Ok(report) => {
                if !report.errors.is_empty() {
                    tracing::warn!(
                        org_id = %org.id,
                        errors = report.errors.len(),
                        "Identity sync finished with mapping errors"
                    );
                }
                result.mapping_errors += report.errors.len();
                result.total_added += report.total_added;
                result.total_removed += report.total_removed;
            }
            Err(e) => {
                tracing::error!(org_id = %org.id, error = %e, "Identity sync failed for organization");
                result.organizations_failed += 1;
            }
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}
