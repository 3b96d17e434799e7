use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{IdentitySyncService, SyncError};
use crate::models::{
    CreateSyncLog, EventAction, EventOutcome, IdentityEvent, IdentitySyncMapping, SyncAction,
};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl IdentitySyncService {
    /// Apply one approve/revoke event to every mapping of its group.
    ///
    /// Incomplete events, unknown actions and groups without mappings are
    /// ignored without a log entry. An unknown user is logged as an error
    /// and ignored. Each mapping is updated independently; `last_sync_at` is
    /// left alone.
    #[instrument(skip(self, event), fields(event_type = ?event.event_type))]
    pub async fn handle_event(
        &self,
        org_id: Uuid,
        event: &IdentityEvent,
    ) -> Result<EventOutcome, SyncError> {
        let (Some(group_id), Some(user_email)) = (
            non_empty(event.group_id.as_deref()),
            non_empty(event.user_email.as_deref()),
        ) else {
            debug!("Event without group or user, ignoring");
            return Ok(EventOutcome::skipped());
        };
        let Some(action) = event.action.as_deref().and_then(EventAction::parse) else {
            debug!(action = ?event.action, "Event action is not approved/revoked, ignoring");
            return Ok(EventOutcome::skipped());
        };

        let mappings = self
            .db
            .identity_sync_mappings()
            .list_by_external_group(org_id, group_id)
            .await?;
        if mappings.is_empty() {
            debug!(group_id, "No mapping for event group, ignoring");
            return Ok(EventOutcome::skipped());
        }

        let Some(user) = self.db.users().find_by_email(user_email).await? else {
            warn!(group_id, "Event user has no local account");
            self.audit
                .log(
                    org_id,
                    CreateSyncLog::failure(
                        None,
                        json!({ "groupId": group_id, "userEmail": user_email }),
                        format!("User not found: {}", user_email),
                    ),
                )
                .await?;
            return Ok(EventOutcome::skipped());
        };

        for mapping in &mappings {
            let details = json!({
                "groupId": group_id,
                "userEmail": user_email,
                "userId": user.id,
                "targetType": mapping.target_type,
                "targetId": mapping.target_id,
                "eventType": event.event_type,
            });

            match self.apply_event(mapping, action, user.id).await {
                Ok(()) => {
                    let log_action = match action {
                        EventAction::Approved => SyncAction::UserAdded,
                        EventAction::Revoked => SyncAction::UserRemoved,
                    };
                    self.audit
                        .log(
                            org_id,
                            CreateSyncLog::success(Some(mapping.id), log_action, details),
                        )
                        .await?;
                }
                Err(e) => {
                    warn!(mapping_id = %mapping.id, error = %e, "Failed to apply identity event");
                    self.audit
                        .log(
                            org_id,
                            CreateSyncLog::failure(
                                Some(mapping.id),
                                json!({ "groupId": group_id, "userEmail": user_email }),
                                e.to_string(),
                            ),
                        )
                        .await?;
                }
            }
        }

        info!(group_id, %action, mappings = mappings.len(), "Identity event applied");
        Ok(EventOutcome {
            processed: true,
            action: Some(action),
        })
    }

    async fn apply_event(
        &self,
        mapping: &IdentitySyncMapping,
        action: EventAction,
        user_id: Uuid,
    ) -> Result<(), SyncError> {
        let adapter = self.targets.get(mapping.target_type);
        match action {
            EventAction::Approved => {
                adapter
                    .add_member(mapping.org_id, &mapping.target_id, user_id)
                    .await?
            }
            EventAction::Revoked => {
                adapter
                    .remove_member(mapping.org_id, &mapping.target_id, user_id)
                    .await?
            }
        }
        Ok(())
    }
}
