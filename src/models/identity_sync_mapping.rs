use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validators::validate_external_id;

/// Kind of local entity whose membership a mapping keeps in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetType {
    /// A local group; `target_id` is the group's UUID.
    Group,
    /// A project role; `target_id` is the role's UUID. Membership is the set of
    /// users holding the role on any project of the organization.
    ProjectRole,
    /// An organization role; `target_id` is the role name itself.
    OrganizationRole,
}

impl TargetType {
    pub const ALL: [TargetType; 3] = [
        TargetType::Group,
        TargetType::ProjectRole,
        TargetType::OrganizationRole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::ProjectRole => "projectRole",
            Self::OrganizationRole => "organizationRole",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group" => Ok(Self::Group),
            "projectRole" => Ok(Self::ProjectRole),
            "organizationRole" => Ok(Self::OrganizationRole),
            _ => Err(format!("Invalid target type: {}", s)),
        }
    }
}

/// Direction of synchronization for a mapping.
///
/// Only `Pull` has an execution path. `Push` and `Bidirectional` are accepted
/// and stored, and reconciliation treats them exactly like `Pull`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    #[default]
    Pull,
    Push,
    Bidirectional,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Bidirectional => "bidirectional",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull" => Ok(Self::Pull),
            "push" => Ok(Self::Push),
            "bidirectional" => Ok(Self::Bidirectional),
            _ => Err(format!("Invalid sync direction: {}", s)),
        }
    }
}

/// Identity sync mapping - binds one external identity provider group to one
/// local target (group, project role or organization role).
///
/// Mappings are created by an admin after the target has been validated and are
/// never created by sync itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySyncMapping {
    /// Unique identifier for this mapping
    pub id: Uuid,
    /// Organization this mapping belongs to (mappings are org-scoped)
    pub org_id: Uuid,
    /// Group identifier at the identity provider
    pub external_group_id: String,
    /// Group display name at the identity provider (informational)
    pub external_group_name: String,
    pub target_type: TargetType,
    /// Local entity ID, or the role name for `organizationRole`
    pub target_id: String,
    /// Descriptive label, not used for matching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    pub sync_direction: SyncDirection,
    /// Set by a successful full reconciliation only
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new identity sync mapping.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIdentitySyncMapping {
    #[validate(custom(function = "validate_external_id"))]
    pub external_group_id: String,
    #[validate(length(min = 1, max = 512))]
    pub external_group_name: String,
    pub target_type: TargetType,
    #[validate(length(min = 1, max = 255))]
    pub target_id: String,
    #[validate(length(min = 1, max = 255))]
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub sync_direction: SyncDirection,
}
