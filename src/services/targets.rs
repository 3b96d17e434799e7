//! Target adapters: membership primitives for each kind of local target.
//!
//! Each [`TargetType`] has one adapter. Adds and removes are idempotent, so
//! reconciliation and the event path can apply them without first checking
//! current state.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::{DbError, DbPool},
    models::{OrgRole, TargetType},
};

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("{target_type} {target_id} not found")]
    NotFound {
        target_type: TargetType,
        target_id: String,
    },

    #[error("Invalid organization role '{role}'. Valid roles: {valid}")]
    InvalidRole { role: String, valid: String },

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type TargetResult<T> = Result<T, TargetError>;

#[async_trait]
pub trait TargetAdapter: Send + Sync {
    fn target_type(&self) -> TargetType;

    /// Check that `target_id` names an existing target in the organization.
    async fn validate(&self, org_id: Uuid, target_id: &str) -> TargetResult<()>;

    async fn current_members(&self, org_id: Uuid, target_id: &str) -> TargetResult<HashSet<Uuid>>;

    /// No-op if the user already holds the target.
    async fn add_member(&self, org_id: Uuid, target_id: &str, user_id: Uuid) -> TargetResult<()>;

    /// No-op if the user does not hold the target.
    async fn remove_member(&self, org_id: Uuid, target_id: &str, user_id: Uuid)
    -> TargetResult<()>;
}

fn not_found(target_type: TargetType, target_id: &str) -> TargetError {
    TargetError::NotFound {
        target_type,
        target_id: target_id.to_string(),
    }
}

/// Local entity IDs are UUIDs; anything else cannot exist.
fn parse_entity_id(target_type: TargetType, target_id: &str) -> TargetResult<Uuid> {
    Uuid::parse_str(target_id).map_err(|_| not_found(target_type, target_id))
}

/// Membership rows of a local group.
pub struct GroupTarget {
    db: Arc<DbPool>,
}

impl GroupTarget {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    async fn group_id(&self, org_id: Uuid, target_id: &str) -> TargetResult<Uuid> {
        let id = parse_entity_id(TargetType::Group, target_id)?;
        self.db
            .groups()
            .get_by_id(org_id, id)
            .await?
            .map(|g| g.id)
            .ok_or_else(|| not_found(TargetType::Group, target_id))
    }
}

#[async_trait]
impl TargetAdapter for GroupTarget {
    fn target_type(&self) -> TargetType {
        TargetType::Group
    }

    async fn validate(&self, org_id: Uuid, target_id: &str) -> TargetResult<()> {
        self.group_id(org_id, target_id).await.map(|_| ())
    }

    async fn current_members(&self, org_id: Uuid, target_id: &str) -> TargetResult<HashSet<Uuid>> {
        let group_id = self.group_id(org_id, target_id).await?;
        let ids = self.db.groups().list_member_ids(group_id).await?;
        Ok(ids.into_iter().collect())
    }

    async fn add_member(&self, org_id: Uuid, target_id: &str, user_id: Uuid) -> TargetResult<()> {
        let group_id = self.group_id(org_id, target_id).await?;
        self.db.groups().add_member(group_id, user_id).await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        org_id: Uuid,
        target_id: &str,
        user_id: Uuid,
    ) -> TargetResult<()> {
        let group_id = self.group_id(org_id, target_id).await?;
        self.db.groups().remove_member(group_id, user_id).await?;
        Ok(())
    }
}

/// A project role, treated as one pool of holders across every project.
pub struct ProjectRoleTarget {
    db: Arc<DbPool>,
}

impl ProjectRoleTarget {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    async fn role_id(&self, org_id: Uuid, target_id: &str) -> TargetResult<Uuid> {
        let id = parse_entity_id(TargetType::ProjectRole, target_id)?;
        self.db
            .projects()
            .get_role(org_id, id)
            .await?
            .map(|r| r.id)
            .ok_or_else(|| not_found(TargetType::ProjectRole, target_id))
    }
}

#[async_trait]
impl TargetAdapter for ProjectRoleTarget {
    fn target_type(&self) -> TargetType {
        TargetType::ProjectRole
    }

    async fn validate(&self, org_id: Uuid, target_id: &str) -> TargetResult<()> {
        self.role_id(org_id, target_id).await.map(|_| ())
    }

    async fn current_members(&self, org_id: Uuid, target_id: &str) -> TargetResult<HashSet<Uuid>> {
        let role_id = self.role_id(org_id, target_id).await?;
        let ids = self
            .db
            .projects()
            .list_role_holder_ids(org_id, role_id)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Grants the role on a project where it is already held, else on the
    /// organization's first project. Skipped when the organization has no
    /// project at all.
    async fn add_member(&self, org_id: Uuid, target_id: &str, user_id: Uuid) -> TargetResult<()> {
        let role_id = self.role_id(org_id, target_id).await?;
        let projects = self.db.projects();

        if projects
            .list_role_holder_ids(org_id, role_id)
            .await?
            .contains(&user_id)
        {
            return Ok(());
        }

        let project_id = match projects.find_project_with_role(org_id, role_id).await? {
            Some(id) => Some(id),
            None => projects.first_project_id(org_id).await?,
        };
        let Some(project_id) = project_id else {
            debug!(%org_id, %role_id, %user_id, "No project to attach role to, skipping add");
            return Ok(());
        };

        projects.grant_role(project_id, user_id, role_id).await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        org_id: Uuid,
        target_id: &str,
        user_id: Uuid,
    ) -> TargetResult<()> {
        let role_id = self.role_id(org_id, target_id).await?;
        self.db
            .projects()
            .revoke_role(org_id, role_id, user_id)
            .await?;
        Ok(())
    }
}

/// The role field of an organization membership. `target_id` is the role
/// name itself.
///
/// Never creates or deletes memberships: adding a non-member does nothing,
/// and removing resets the role to `member`.
pub struct OrganizationRoleTarget {
    db: Arc<DbPool>,
}

impl OrganizationRoleTarget {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    fn role(target_id: &str) -> TargetResult<OrgRole> {
        target_id.parse().map_err(|_| TargetError::InvalidRole {
            role: target_id.to_string(),
            valid: OrgRole::valid_names(),
        })
    }
}

#[async_trait]
impl TargetAdapter for OrganizationRoleTarget {
    fn target_type(&self) -> TargetType {
        TargetType::OrganizationRole
    }

    async fn validate(&self, _org_id: Uuid, target_id: &str) -> TargetResult<()> {
        Self::role(target_id).map(|_| ())
    }

    async fn current_members(&self, org_id: Uuid, target_id: &str) -> TargetResult<HashSet<Uuid>> {
        let role = Self::role(target_id)?;
        let ids = self
            .db
            .organizations()
            .list_member_ids_with_role(org_id, role)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn add_member(&self, org_id: Uuid, target_id: &str, user_id: Uuid) -> TargetResult<()> {
        let role = Self::role(target_id)?;
        let updated = self
            .db
            .organizations()
            .update_member_role(org_id, user_id, role)
            .await?;
        if !updated {
            debug!(%org_id, %user_id, "User is not an organization member, role not assigned");
        }
        Ok(())
    }

    async fn remove_member(
        &self,
        org_id: Uuid,
        target_id: &str,
        user_id: Uuid,
    ) -> TargetResult<()> {
        Self::role(target_id)?;
        let updated = self
            .db
            .organizations()
            .update_member_role(org_id, user_id, OrgRole::default())
            .await?;
        if !updated {
            debug!(%org_id, %user_id, "User is not an organization member, role not reset");
        }
        Ok(())
    }
}

/// Maps each [`TargetType`] to its adapter.
#[derive(Clone)]
pub struct TargetRegistry {
    group: Arc<dyn TargetAdapter>,
    project_role: Arc<dyn TargetAdapter>,
    organization_role: Arc<dyn TargetAdapter>,
}

impl TargetRegistry {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            group: Arc::new(GroupTarget::new(db.clone())),
            project_role: Arc::new(ProjectRoleTarget::new(db.clone())),
            organization_role: Arc::new(OrganizationRoleTarget::new(db)),
        }
    }

    pub fn get(&self, target_type: TargetType) -> &dyn TargetAdapter {
        match target_type {
            TargetType::Group => self.group.as_ref(),
            TargetType::ProjectRole => self.project_role.as_ref(),
            TargetType::OrganizationRole => self.organization_role.as_ref(),
        }
    }
}
