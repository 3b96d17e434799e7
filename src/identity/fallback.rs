use async_trait::async_trait;

use super::{ClientKind, IdentityProviderClient, IdentityResult, filter_groups};
use crate::models::{ExternalGroup, ExternalMember};

struct FixtureGroup {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    members: &'static [(&'static str, &'static str, &'static str)],
}

const GROUPS: &[FixtureGroup] = &[
    FixtureGroup {
        id: "wg-engineering",
        name: "Engineering",
        description: "Product engineering staff",
        members: &[
            ("id-1001", "alice@example.com", "Alice Anders"),
            ("id-1002", "bob@example.com", "Bob Brandt"),
            ("id-1003", "carol@example.com", "Carol Chen"),
        ],
    },
    FixtureGroup {
        id: "wg-platform-admins",
        name: "Platform Administrators",
        description: "Administrators of the tracking platform",
        members: &[("id-1001", "alice@example.com", "Alice Anders")],
    },
    FixtureGroup {
        id: "wg-finance",
        name: "Finance",
        description: "Finance and accounting",
        members: &[
            ("id-2001", "dave@example.com", "Dave Dunn"),
            ("id-2002", "erin@example.com", "Erin Ellis"),
        ],
    },
    FixtureGroup {
        id: "wg-contractors",
        name: "Contractors",
        description: "External contractors with read-only access",
        members: &[("id-3001", "frank@example.com", "Frank Fisher")],
    },
];

/// Built-in directory used when an organization has no live credentials,
/// so the engine can be exercised without an identity provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackDirectory;

impl FallbackDirectory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityProviderClient for FallbackDirectory {
    async fn list_groups(
        &self,
        search: Option<&str>,
        limit: Option<usize>,
    ) -> IdentityResult<Vec<ExternalGroup>> {
        let groups = GROUPS.iter().map(|g| ExternalGroup {
            id: g.id.to_string(),
            name: g.name.to_string(),
            description: Some(g.description.to_string()),
            member_count: Some(g.members.len() as i64),
        });
        Ok(filter_groups(groups, search, limit))
    }

    /// Unknown groups have no members.
    async fn list_group_members(&self, group_id: &str) -> IdentityResult<Vec<ExternalMember>> {
        let members = GROUPS
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| {
                g.members
                    .iter()
                    .map(|(id, email, name)| ExternalMember {
                        id: id.to_string(),
                        email: email.to_string(),
                        name: name.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(members)
    }

    fn kind(&self) -> ClientKind {
        ClientKind::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_all_groups() {
        let groups = FallbackDirectory::new().list_groups(None, None).await.unwrap();
        assert_eq!(groups.len(), GROUPS.len());
        let engineering = groups.iter().find(|g| g.id == "wg-engineering").unwrap();
        assert_eq!(engineering.member_count, Some(3));
    }

    #[tokio::test]
    async fn test_search_and_limit() {
        let dir = FallbackDirectory::new();
        let groups = dir.list_groups(Some("admin"), None).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "wg-platform-admins");

        // "access" only appears in a description
        let groups = dir.list_groups(Some("ACCESS"), None).await.unwrap();
        assert_eq!(groups[0].id, "wg-contractors");

        assert_eq!(dir.list_groups(None, Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_members() {
        let dir = FallbackDirectory::new();
        let members = dir.list_group_members("wg-finance").await.unwrap();
        let emails: Vec<_> = members.iter().map(|m| m.email.as_str()).collect();
        assert_eq!(emails, vec!["dave@example.com", "erin@example.com"]);

        assert!(dir.list_group_members("wg-unknown").await.unwrap().is_empty());
        assert_eq!(dir.kind(), ClientKind::Fallback);
    }
}
