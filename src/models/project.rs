use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// A role definition that can be granted on any project of its organization.
///
/// Grants live in `project_members` as `(project_id, user_id, role_id)` rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRole {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectRole {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// One `(project, user, role)` grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRoleGrant {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
}
