use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload pushed by the identity provider when access to a group changes.
///
/// Every field is optional: an incomplete event is ignored rather than
/// rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityEvent {
    /// Free text, informational only
    pub event_type: Option<String>,
    pub user_email: Option<String>,
    pub group_id: Option<String>,
    /// "approved" or "revoked"
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Approved,
    Revoked,
}

impl EventAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(Self::Approved),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => f.write_str("approved"),
            Self::Revoked => f.write_str("revoked"),
        }
    }
}

/// Result of applying an [`IdentityEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<EventAction>,
}

impl EventOutcome {
    pub fn skipped() -> Self {
        Self {
            processed: false,
            action: None,
        }
    }
}

/// Membership changes applied by reconciling one mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    pub added: usize,
    pub removed: usize,
}

/// Aggregate result of syncing every mapping in an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullSyncReport {
    pub total_added: usize,
    pub total_removed: usize,
    /// One entry per failed mapping, prefixed with the mapping ID
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_accepts_partial_fields() {
        let event: IdentityEvent =
            serde_json::from_str(r#"{"eventType":"ACCESS_REQUEST","groupId":"wg-1"}"#).unwrap();
        assert_eq!(event.group_id.as_deref(), Some("wg-1"));
        assert!(event.user_email.is_none());
        assert!(event.action.is_none());

        let empty: IdentityEvent = serde_json::from_str("{}").unwrap();
        assert!(empty.group_id.is_none());
    }

    #[test]
    fn test_event_action_parse() {
        assert_eq!(EventAction::parse("approved"), Some(EventAction::Approved));
        assert_eq!(EventAction::parse("revoked"), Some(EventAction::Revoked));
        assert_eq!(EventAction::parse("APPROVED"), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let out = EventOutcome {
            processed: true,
            action: Some(EventAction::Revoked),
        };
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            serde_json::json!({"processed": true, "action": "revoked"})
        );
        assert_eq!(
            serde_json::to_value(EventOutcome::skipped()).unwrap(),
            serde_json::json!({"processed": false})
        );
    }
}
