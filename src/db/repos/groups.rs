use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateGroup, Group},
};

/// Local groups and group membership.
#[async_trait]
pub trait GroupRepo: Send + Sync {
    async fn create(&self, org_id: Uuid, input: CreateGroup) -> DbResult<Group>;

    /// Get a group by ID, scoped to an organization.
    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> DbResult<Option<Group>>;

    async fn list_member_ids(&self, group_id: Uuid) -> DbResult<Vec<Uuid>>;

    /// Add a member. Returns `false` if the user was already a member.
    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> DbResult<bool>;

    /// Remove a member. Returns `false` if the user was not a member.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> DbResult<bool>;
}
