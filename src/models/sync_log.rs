use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// What a sync log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// A single user was added to a target by the event path
    UserAdded,
    /// A single user was removed from a target by the event path
    UserRemoved,
    /// One mapping finished a full reconciliation
    GroupSynced,
    /// Organization-wide summary written after syncing every mapping
    FullSync,
    /// Reconciliation or event application failed
    Error,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserAdded => "user_added",
            Self::UserRemoved => "user_removed",
            Self::GroupSynced => "group_synced",
            Self::FullSync => "full_sync",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_added" => Ok(Self::UserAdded),
            "user_removed" => Ok(Self::UserRemoved),
            "group_synced" => Ok(Self::GroupSynced),
            "full_sync" => Ok(Self::FullSync),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid sync action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Success,
    Failure,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("Invalid sync status: {}", s)),
        }
    }
}

/// Append-only record of a sync action and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: Uuid,
    pub org_id: Uuid,
    /// None for organization-wide entries (full sync summaries, unresolved users)
    pub mapping_id: Option<Uuid>,
    pub action: SyncAction,
    /// Free-form payload; its shape depends on `action`
    pub details: JsonValue,
    pub status: SyncStatus,
    /// Present only when `status` is `failure`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for appending a sync log entry
#[derive(Debug, Clone)]
pub struct CreateSyncLog {
    pub mapping_id: Option<Uuid>,
    pub action: SyncAction,
    pub details: JsonValue,
    pub status: SyncStatus,
    pub error: Option<String>,
}

impl CreateSyncLog {
    /// A successful entry.
    pub fn success(mapping_id: Option<Uuid>, action: SyncAction, details: JsonValue) -> Self {
        Self {
            mapping_id,
            action,
            details,
            status: SyncStatus::Success,
            error: None,
        }
    }

    /// An `error` entry carrying the failure message verbatim.
    pub fn failure(mapping_id: Option<Uuid>, details: JsonValue, error: impl Into<String>) -> Self {
        Self {
            mapping_id,
            action: SyncAction::Error,
            details,
            status: SyncStatus::Failure,
            error: Some(error.into()),
        }
    }
}

/// Query parameters for listing sync logs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncLogQuery {
    /// Only entries attached to this mapping
    pub mapping_id: Option<Uuid>,
}
