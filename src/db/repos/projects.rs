use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateProject, CreateProjectRole, Project, ProjectRole, ProjectRoleGrant},
};

/// Projects, project roles and role grants.
///
/// Role definitions are organization-scoped; a grant attaches a role to a
/// user on one project.
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn create(&self, org_id: Uuid, input: CreateProject) -> DbResult<Project>;

    /// Oldest project of the organization, if any.
    async fn first_project_id(&self, org_id: Uuid) -> DbResult<Option<Uuid>>;

    async fn create_role(&self, org_id: Uuid, input: CreateProjectRole) -> DbResult<ProjectRole>;

    async fn get_role(&self, org_id: Uuid, role_id: Uuid) -> DbResult<Option<ProjectRole>>;

    /// Distinct users holding the role on any project of the organization.
    async fn list_role_holder_ids(&self, org_id: Uuid, role_id: Uuid) -> DbResult<Vec<Uuid>>;

    /// A project on which someone already holds the role.
    async fn find_project_with_role(&self, org_id: Uuid, role_id: Uuid)
    -> DbResult<Option<Uuid>>;

    /// Grant a role on a project. Returns `false` if the grant already existed.
    async fn grant_role(&self, project_id: Uuid, user_id: Uuid, role_id: Uuid) -> DbResult<bool>;

    /// Revoke the role from the user on every project of the organization.
    /// Returns the number of grants removed.
    async fn revoke_role(&self, org_id: Uuid, role_id: Uuid, user_id: Uuid) -> DbResult<u64>;

    async fn list_role_grants(&self, org_id: Uuid, role_id: Uuid)
    -> DbResult<Vec<ProjectRoleGrant>>;
}
