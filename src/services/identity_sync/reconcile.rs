use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{IdentitySyncService, SyncError};
use crate::{
    identity::IdentityProviderClient,
    models::{CreateSyncLog, IdentitySyncMapping, SyncAction, SyncCounts},
};

/// Membership changes needed to make a target match the provider group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub to_add: Vec<Uuid>,
    pub to_remove: Vec<Uuid>,
}

impl MembershipDiff {
    /// `desired - current` to add, `current - desired` to remove, both sorted.
    pub fn compute(desired: &HashSet<Uuid>, current: &HashSet<Uuid>) -> Self {
        let to_add: BTreeSet<Uuid> = desired.difference(current).copied().collect();
        let to_remove: BTreeSet<Uuid> = current.difference(desired).copied().collect();
        Self {
            to_add: to_add.into_iter().collect(),
            to_remove: to_remove.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

impl IdentitySyncService {
    /// Reconcile one mapping, resolving the organization's provider client first.
    ///
    /// Failures are recorded as an `error` sync log entry and returned.
    #[instrument(skip(self))]
    pub async fn sync_mapping(&self, org_id: Uuid, mapping_id: Uuid) -> Result<SyncCounts, SyncError> {
        let mapping = self
            .db
            .identity_sync_mappings()
            .get_by_id(org_id, mapping_id)
            .await?
            .ok_or(SyncError::MappingNotFound)?;

        match self.resolver.resolve(org_id).await {
            Ok(client) => self.reconcile_one(client.as_ref(), &mapping).await,
            Err(e) => self.record_failure(&mapping, e.into()).await,
        }
    }

    #[instrument(
        skip(self, client, mapping),
        fields(mapping_id = %mapping.id, external_group_id = %mapping.external_group_id)
    )]
    pub(super) async fn reconcile_one(
        &self,
        client: &dyn IdentityProviderClient,
        mapping: &IdentitySyncMapping,
    ) -> Result<SyncCounts, SyncError> {
        let counts = match self.apply_diff(client, mapping).await {
            Ok(counts) => counts,
            Err(e) => return self.record_failure(mapping, e).await,
        };

        self.db
            .identity_sync_mappings()
            .mark_synced(mapping.org_id, mapping.id, Utc::now())
            .await?;

        self.audit
            .log(
                mapping.org_id,
                CreateSyncLog::success(
                    Some(mapping.id),
                    SyncAction::GroupSynced,
                    json!({
                        "groupId": mapping.external_group_id,
                        "groupName": mapping.external_group_name,
                        "targetType": mapping.target_type,
                        "targetId": mapping.target_id,
                        "added": counts.added,
                        "removed": counts.removed,
                    }),
                ),
            )
            .await?;

        info!(added = counts.added, removed = counts.removed, "Mapping synced");
        Ok(counts)
    }

    /// Write an `error` entry for the mapping, then hand the error back.
    pub(super) async fn record_failure(
        &self,
        mapping: &IdentitySyncMapping,
        error: SyncError,
    ) -> Result<SyncCounts, SyncError> {
        warn!(mapping_id = %mapping.id, error = %error, "Mapping sync failed");
        self.audit
            .log(
                mapping.org_id,
                CreateSyncLog::failure(
                    Some(mapping.id),
                    json!({ "groupId": mapping.external_group_id }),
                    error.to_string(),
                ),
            )
            .await?;
        Err(error)
    }

    async fn apply_diff(
        &self,
        client: &dyn IdentityProviderClient,
        mapping: &IdentitySyncMapping,
    ) -> Result<SyncCounts, SyncError> {
        let members = client
            .list_group_members(&mapping.external_group_id)
            .await?;

        // Case folding happens in the user lookup so both sides use the same rules
        let mut emails: Vec<String> = members
            .iter()
            .map(|m| m.email.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        emails.sort_by_key(|e| e.to_ascii_lowercase());
        emails.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

        let desired: HashSet<Uuid> = if emails.is_empty() {
            HashSet::new()
        } else {
            self.db
                .users()
                .find_by_emails(&emails)
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect()
        };
        if desired.len() < emails.len() {
            debug!(
                unresolved = emails.len() - desired.len(),
                "Provider members without a local account were skipped"
            );
        }

        let adapter = self.targets.get(mapping.target_type);
        let current = adapter
            .current_members(mapping.org_id, &mapping.target_id)
            .await?;

        let diff = MembershipDiff::compute(&desired, &current);
        for user_id in &diff.to_add {
            adapter
                .add_member(mapping.org_id, &mapping.target_id, *user_id)
                .await?;
        }
        for user_id in &diff.to_remove {
            adapter
                .remove_member(mapping.org_id, &mapping.target_id, *user_id)
                .await?;
        }

        Ok(SyncCounts {
            added: diff.to_add.len(),
            removed: diff.to_remove.len(),
        })
    }
}
