use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateOrganization, OrgMember, OrgRole, Organization},
};

/// Organizations and their memberships.
#[async_trait]
pub trait OrganizationRepo: Send + Sync {
    async fn create(&self, input: CreateOrganization) -> DbResult<Organization>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Organization>>;

    /// Every organization, oldest first. Used by the scheduled sync worker.
    async fn list_all(&self) -> DbResult<Vec<Organization>>;

    /// Add a user to an organization. Fails with `Conflict` if already a member.
    async fn add_member(&self, org_id: Uuid, user_id: Uuid, role: OrgRole)
    -> DbResult<OrgMember>;

    async fn get_member(&self, org_id: Uuid, user_id: Uuid) -> DbResult<Option<OrgMember>>;

    /// IDs of members whose role equals `role`.
    async fn list_member_ids_with_role(&self, org_id: Uuid, role: OrgRole)
    -> DbResult<Vec<Uuid>>;

    /// Change an existing member's role.
    ///
    /// Returns `false` (and changes nothing) if the user is not a member.
    /// Never creates a membership.
    async fn update_member_role(&self, org_id: Uuid, user_id: Uuid, role: OrgRole)
    -> DbResult<bool>;
}
