use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ListParams, ListResult};
use crate::{
    db::error::DbResult,
    models::{CreateIdentitySyncMapping, IdentitySyncMapping},
};

/// Repository for identity sync mappings.
///
/// Every method is scoped by organization: a mapping owned by another
/// organization behaves exactly like a missing one.
#[async_trait]
pub trait IdentitySyncMappingRepo: Send + Sync {
    /// Persist a mapping. The target must already have been validated.
    ///
    /// Fails with `Conflict` if the organization already maps the same
    /// external group to the same target.
    async fn create(
        &self,
        org_id: Uuid,
        input: CreateIdentitySyncMapping,
    ) -> DbResult<IdentitySyncMapping>;

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<IdentitySyncMapping>>;

    /// Paginated listing, newest first by default.
    async fn list_by_org(
        &self,
        org_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<IdentitySyncMapping>>;

    /// Every mapping of the organization in creation order.
    async fn list_all_by_org(&self, org_id: Uuid) -> DbResult<Vec<IdentitySyncMapping>>;

    /// Mappings referencing one external group, in creation order.
    async fn list_by_external_group(
        &self,
        org_id: Uuid,
        external_group_id: &str,
    ) -> DbResult<Vec<IdentitySyncMapping>>;

    /// Record a successful full reconciliation.
    async fn mark_synced(&self, org_id: Uuid, id: Uuid, at: DateTime<Utc>) -> DbResult<()>;

    /// Delete a mapping. Fails with `NotFound` if the organization does not own it.
    async fn delete(&self, org_id: Uuid, id: Uuid) -> DbResult<()>;
}
