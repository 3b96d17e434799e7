use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use uuid::Uuid;

use super::*;
use crate::{
    db::{ListParams, tests::harness::*},
    identity::{ClientKind, IdentityProviderClient, IdentityResult},
    models::{
        CreateIdentitySyncMapping, EventAction, ExternalGroup, ExternalMember, IdentityEvent,
        IdentitySyncMapping, OrgRole, SyncAction, SyncCounts, SyncDirection, SyncLog,
        SyncLogQuery, SyncStatus, TargetType,
    },
};

/// In-memory provider: group ID to member emails. Listing a group in
/// `failing` returns a 500.
#[derive(Default)]
struct StaticDirectory {
    groups: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
}

impl StaticDirectory {
    fn group(mut self, id: &str, emails: &[&str]) -> Self {
        self.groups
            .insert(id.to_string(), emails.iter().map(|e| e.to_string()).collect());
        self
    }

    fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }
}

#[async_trait]
impl IdentityProviderClient for StaticDirectory {
    async fn list_groups(
        &self,
        _search: Option<&str>,
        _limit: Option<usize>,
    ) -> IdentityResult<Vec<ExternalGroup>> {
        Ok(Vec::new())
    }

    async fn list_group_members(&self, group_id: &str) -> IdentityResult<Vec<ExternalMember>> {
        if self.failing.contains(group_id) {
            return Err(IdentityError::Status {
                status: 500,
                body: format!("upstream failure for {}", group_id),
            });
        }
        Ok(self
            .groups
            .get(group_id)
            .map(|emails| {
                emails
                    .iter()
                    .enumerate()
                    .map(|(i, email)| ExternalMember {
                        id: format!("ext-{}", i),
                        email: email.clone(),
                        name: email.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn kind(&self) -> ClientKind {
        ClientKind::Live
    }
}

struct StaticResolver(Option<Arc<StaticDirectory>>);

#[async_trait]
impl ClientResolver for StaticResolver {
    async fn resolve(&self, _org_id: Uuid) -> IdentityResult<Arc<dyn IdentityProviderClient>> {
        match &self.0 {
            Some(dir) => Ok(dir.clone()),
            None => Err(IdentityError::InvalidTenantUrl("not a url".into())),
        }
    }
}

struct Ctx {
    db: Arc<DbPool>,
    service: IdentitySyncService,
    org_id: Uuid,
}

async fn setup(directory: Option<StaticDirectory>) -> Ctx {
    let db = Arc::new(create_test_db().await);
    let org_id = seed_org(&db, "acme").await;
    let service = IdentitySyncService::new(
        db.clone(),
        Arc::new(StaticResolver(directory.map(Arc::new))),
        TargetRegistry::new(db.clone()),
        SyncLogService::new(db.clone()),
    );
    Ctx {
        db,
        service,
        org_id,
    }
}

async fn create_mapping(
    ctx: &Ctx,
    group: &str,
    target_type: TargetType,
    target_id: &str,
) -> IdentitySyncMapping {
    ctx.db
        .identity_sync_mappings()
        .create(
            ctx.org_id,
            CreateIdentitySyncMapping {
                external_group_id: group.into(),
                external_group_name: group.to_uppercase(),
                target_type,
                target_id: target_id.into(),
                role_name: None,
                sync_direction: SyncDirection::Pull,
            },
        )
        .await
        .unwrap()
}

async fn logs(ctx: &Ctx) -> Vec<SyncLog> {
    ctx.db
        .sync_logs()
        .list(ctx.org_id, SyncLogQuery::default(), ListParams::default())
        .await
        .unwrap()
        .items
}

async fn group_members(ctx: &Ctx, group_id: Uuid) -> HashSet<Uuid> {
    ctx.db
        .groups()
        .list_member_ids(group_id)
        .await
        .unwrap()
        .into_iter()
        .collect()
}

fn event(group: Option<&str>, email: Option<&str>, action: Option<&str>) -> IdentityEvent {
    IdentityEvent {
        event_type: Some("ACCESS_REQUEST_DECISION".into()),
        user_email: email.map(String::from),
        group_id: group.map(String::from),
        action: action.map(String::from),
    }
}

#[tokio::test]
async fn test_reconcile_computes_exact_diff() {
    let ctx = setup(Some(StaticDirectory::default().group(
        "wg-eng",
        &["A@example.com", "b@example.com", "c@example.com"],
    )))
    .await;
    let a = seed_user(&ctx.db, "a@example.com").await;
    let b = seed_user(&ctx.db, "b@example.com").await;
    let d = seed_user(&ctx.db, "d@example.com").await;
    let group = seed_group(&ctx.db, ctx.org_id, "eng").await;
    ctx.db.groups().add_member(group, b).await.unwrap();
    ctx.db.groups().add_member(group, d).await.unwrap();
    let mapping = create_mapping(&ctx, "wg-eng", TargetType::Group, &group.to_string()).await;

    let counts = ctx.service.sync_mapping(ctx.org_id, mapping.id).await.unwrap();

    assert_eq!(counts, SyncCounts { added: 1, removed: 1 });
    assert_eq!(group_members(&ctx, group).await, HashSet::from([a, b]));

    let synced = ctx
        .db
        .identity_sync_mappings()
        .get_by_id(ctx.org_id, mapping.id)
        .await
        .unwrap()
        .unwrap();
    assert!(synced.last_sync_at.is_some());

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, SyncAction::GroupSynced);
    assert_eq!(entries[0].mapping_id, Some(mapping.id));
    assert_eq!(entries[0].details["added"], 1);
    assert_eq!(entries[0].details["removed"], 1);
    assert_eq!(entries[0].details["groupId"], "wg-eng");
}

#[tokio::test]
async fn test_reconcile_matches_emails_case_insensitively() {
    let ctx = setup(Some(StaticDirectory::default().group(
        "wg-eng",
        &[" BOB@example.com ", "bob@EXAMPLE.com", "Carol@Example.COM", ""],
    )))
    .await;
    let bob = seed_user(&ctx.db, "Bob@Example.com").await;
    let carol = seed_user(&ctx.db, "carol@example.com").await;
    let group = seed_group(&ctx.db, ctx.org_id, "eng").await;
    let mapping = create_mapping(&ctx, "wg-eng", TargetType::Group, &group.to_string()).await;

    let counts = ctx.service.sync_mapping(ctx.org_id, mapping.id).await.unwrap();

    assert_eq!(counts, SyncCounts { added: 2, removed: 0 });
    assert_eq!(group_members(&ctx, group).await, HashSet::from([bob, carol]));
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let ctx = setup(Some(
        StaticDirectory::default().group("wg-eng", &["a@example.com", "b@example.com"]),
    ))
    .await;
    seed_user(&ctx.db, "a@example.com").await;
    seed_user(&ctx.db, "b@example.com").await;
    let group = seed_group(&ctx.db, ctx.org_id, "eng").await;
    let mapping = create_mapping(&ctx, "wg-eng", TargetType::Group, &group.to_string()).await;

    let first = ctx.service.sync_mapping(ctx.org_id, mapping.id).await.unwrap();
    assert_eq!(first, SyncCounts { added: 2, removed: 0 });

    let second = ctx.service.sync_mapping(ctx.org_id, mapping.id).await.unwrap();
    assert_eq!(second, SyncCounts::default());
    assert_eq!(group_members(&ctx, group).await.len(), 2);

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.action == SyncAction::GroupSynced));
    assert!(entries.iter().any(|e| e.details["added"] == 0));
}

#[tokio::test]
async fn test_reconcile_failure_is_logged_and_returned() {
    let ctx = setup(Some(StaticDirectory::default().failing("wg-eng"))).await;
    let group = seed_group(&ctx.db, ctx.org_id, "eng").await;
    let mapping = create_mapping(&ctx, "wg-eng", TargetType::Group, &group.to_string()).await;

    let err = ctx
        .service
        .sync_mapping(ctx.org_id, mapping.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Identity(IdentityError::Status { status: 500, .. })));

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, SyncAction::Error);
    assert_eq!(entries[0].status, SyncStatus::Failure);
    assert_eq!(entries[0].details["groupId"], "wg-eng");
    assert_eq!(entries[0].error.as_deref(), Some(err.to_string().as_str()));

    let mapping = ctx
        .db
        .identity_sync_mappings()
        .get_by_id(ctx.org_id, mapping.id)
        .await
        .unwrap()
        .unwrap();
    assert!(mapping.last_sync_at.is_none());
}

#[tokio::test]
async fn test_sync_mapping_of_other_org_is_not_found() {
    let ctx = setup(Some(StaticDirectory::default())).await;
    let other = seed_org(&ctx.db, "other").await;
    let foreign = ctx
        .db
        .identity_sync_mappings()
        .create(
            other,
            CreateIdentitySyncMapping {
                external_group_id: "wg-1".into(),
                external_group_name: "One".into(),
                target_type: TargetType::OrganizationRole,
                target_id: "admin".into(),
                role_name: None,
                sync_direction: SyncDirection::Pull,
            },
        )
        .await
        .unwrap();

    let err = ctx
        .service
        .sync_mapping(ctx.org_id, foreign.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::MappingNotFound));
    assert!(logs(&ctx).await.is_empty());
}

#[tokio::test]
async fn test_org_role_reconcile_never_creates_membership() {
    let ctx = setup(Some(StaticDirectory::default().group(
        "wg-admins",
        &["member@example.com", "outsider@example.com"],
    )))
    .await;
    let member = seed_member(&ctx.db, ctx.org_id, "member@example.com", OrgRole::Member).await;
    let outsider = seed_user(&ctx.db, "outsider@example.com").await;
    let stale_admin = seed_member(&ctx.db, ctx.org_id, "old@example.com", OrgRole::Admin).await;
    let mapping = create_mapping(&ctx, "wg-admins", TargetType::OrganizationRole, "admin").await;

    let counts = ctx.service.sync_mapping(ctx.org_id, mapping.id).await.unwrap();
    // Both resolved users count as adds; only the member is changed
    assert_eq!(counts, SyncCounts { added: 2, removed: 1 });

    let orgs = ctx.db.organizations();
    assert_eq!(
        orgs.get_member(ctx.org_id, member).await.unwrap().unwrap().role,
        OrgRole::Admin
    );
    assert!(orgs.get_member(ctx.org_id, outsider).await.unwrap().is_none());
    assert_eq!(
        orgs.get_member(ctx.org_id, stale_admin)
            .await
            .unwrap()
            .unwrap()
            .role,
        OrgRole::Member
    );
}

#[tokio::test]
async fn test_project_role_reconcile() {
    let ctx = setup(Some(
        StaticDirectory::default().group("wg-dev", &["a@example.com", "b@example.com"]),
    ))
    .await;
    let project = seed_project(&ctx.db, ctx.org_id, "apollo").await;
    let role = seed_project_role(&ctx.db, ctx.org_id, "developer").await;
    let a = seed_user(&ctx.db, "a@example.com").await;
    let b = seed_user(&ctx.db, "b@example.com").await;
    let c = seed_user(&ctx.db, "c@example.com").await;
    ctx.db.projects().grant_role(project, c, role).await.unwrap();
    let mapping = create_mapping(&ctx, "wg-dev", TargetType::ProjectRole, &role.to_string()).await;

    let counts = ctx.service.sync_mapping(ctx.org_id, mapping.id).await.unwrap();
    assert_eq!(counts, SyncCounts { added: 2, removed: 1 });

    let holders: HashSet<Uuid> = ctx
        .db
        .projects()
        .list_role_holder_ids(ctx.org_id, role)
        .await
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(holders, HashSet::from([a, b]));
}

#[tokio::test]
async fn test_sync_all_isolates_failing_mapping() {
    let ctx = setup(Some(
        StaticDirectory::default()
            .group("wg-one", &["a@example.com"])
            .failing("wg-two")
            .group("wg-three", &["b@example.com", "c@example.com"]),
    ))
    .await;
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        seed_user(&ctx.db, email).await;
    }
    let g1 = seed_group(&ctx.db, ctx.org_id, "one").await;
    let g2 = seed_group(&ctx.db, ctx.org_id, "two").await;
    let g3 = seed_group(&ctx.db, ctx.org_id, "three").await;
    create_mapping(&ctx, "wg-one", TargetType::Group, &g1.to_string()).await;
    let failing = create_mapping(&ctx, "wg-two", TargetType::Group, &g2.to_string()).await;
    create_mapping(&ctx, "wg-three", TargetType::Group, &g3.to_string()).await;

    let report = ctx.service.sync_all(ctx.org_id).await.unwrap();

    assert_eq!(report.total_added, 3);
    assert_eq!(report.total_removed, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with(&format!("Mapping {}: ", failing.id)));
    assert_eq!(group_members(&ctx, g3).await.len(), 2);

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 4);
    let summary = entries
        .iter()
        .find(|e| e.action == SyncAction::FullSync)
        .unwrap();
    assert!(summary.mapping_id.is_none());
    assert_eq!(summary.details["mappings"], 3);
    assert_eq!(summary.details["totalAdded"], 3);
    assert_eq!(summary.details["errors"], 1);
    let errors: Vec<_> = entries
        .iter()
        .filter(|e| e.action == SyncAction::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].mapping_id, Some(failing.id));
}

#[tokio::test]
async fn test_sync_all_without_client_reports_every_mapping() {
    let ctx = setup(None).await;
    create_mapping(&ctx, "wg-one", TargetType::OrganizationRole, "admin").await;
    create_mapping(&ctx, "wg-two", TargetType::OrganizationRole, "viewer").await;

    let report = ctx.service.sync_all(ctx.org_id).await.unwrap();
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.contains("Identity provider unavailable")));

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.action == SyncAction::FullSync)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_sync_all_with_no_mappings_writes_summary() {
    let ctx = setup(Some(StaticDirectory::default())).await;
    let report = ctx.service.sync_all(ctx.org_id).await.unwrap();
    assert_eq!(report, Default::default());

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, SyncAction::FullSync);
    assert_eq!(entries[0].details["mappings"], 0);
}

#[tokio::test]
async fn test_event_gating_writes_nothing() {
    let ctx = setup(Some(StaticDirectory::default())).await;
    seed_user(&ctx.db, "a@example.com").await;
    let group = seed_group(&ctx.db, ctx.org_id, "eng").await;
    create_mapping(&ctx, "wg-eng", TargetType::Group, &group.to_string()).await;

    let cases = [
        event(None, Some("a@example.com"), Some("approved")),
        event(Some("wg-eng"), None, Some("approved")),
        event(Some(""), Some("a@example.com"), Some("approved")),
        event(Some("wg-eng"), Some("a@example.com"), None),
        event(Some("wg-eng"), Some("a@example.com"), Some("escalated")),
        event(Some("wg-unmapped"), Some("a@example.com"), Some("approved")),
    ];
    for case in &cases {
        let outcome = ctx.service.handle_event(ctx.org_id, case).await.unwrap();
        assert!(!outcome.processed);
        assert!(outcome.action.is_none());
    }

    assert!(logs(&ctx).await.is_empty());
    assert!(group_members(&ctx, group).await.is_empty());
}

#[tokio::test]
async fn test_event_unknown_user_logs_error() {
    let ctx = setup(Some(StaticDirectory::default())).await;
    create_mapping(&ctx, "wg-eng", TargetType::OrganizationRole, "admin").await;

    let outcome = ctx
        .service
        .handle_event(
            ctx.org_id,
            &event(Some("wg-eng"), Some("ghost@example.com"), Some("approved")),
        )
        .await
        .unwrap();
    assert!(!outcome.processed);

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, SyncAction::Error);
    assert!(entries[0].mapping_id.is_none());
    assert_eq!(entries[0].details["userEmail"], "ghost@example.com");
    assert_eq!(entries[0].details["groupId"], "wg-eng");
}

#[tokio::test]
async fn test_event_approve_and_revoke_every_mapping() {
    let ctx = setup(Some(StaticDirectory::default())).await;
    let user = seed_member(&ctx.db, ctx.org_id, "a@example.com", OrgRole::Viewer).await;
    let group = seed_group(&ctx.db, ctx.org_id, "eng").await;
    let by_group = create_mapping(&ctx, "wg-eng", TargetType::Group, &group.to_string()).await;
    let by_role = create_mapping(&ctx, "wg-eng", TargetType::OrganizationRole, "admin").await;

    let outcome = ctx
        .service
        .handle_event(
            ctx.org_id,
            &event(Some("wg-eng"), Some("A@Example.com"), Some("approved")),
        )
        .await
        .unwrap();
    assert!(outcome.processed);
    assert_eq!(outcome.action, Some(EventAction::Approved));
    assert_eq!(group_members(&ctx, group).await, HashSet::from([user]));
    let orgs = ctx.db.organizations();
    assert_eq!(
        orgs.get_member(ctx.org_id, user).await.unwrap().unwrap().role,
        OrgRole::Admin
    );

    // Applying the same approval again is harmless
    ctx.service
        .handle_event(
            ctx.org_id,
            &event(Some("wg-eng"), Some("a@example.com"), Some("approved")),
        )
        .await
        .unwrap();
    assert_eq!(group_members(&ctx, group).await.len(), 1);

    let outcome = ctx
        .service
        .handle_event(
            ctx.org_id,
            &event(Some("wg-eng"), Some("a@example.com"), Some("revoked")),
        )
        .await
        .unwrap();
    assert_eq!(outcome.action, Some(EventAction::Revoked));
    assert!(group_members(&ctx, group).await.is_empty());
    assert_eq!(
        orgs.get_member(ctx.org_id, user).await.unwrap().unwrap().role,
        OrgRole::Member
    );

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 6);
    let removed: HashSet<_> = entries
        .iter()
        .filter(|e| e.action == SyncAction::UserRemoved)
        .map(|e| e.mapping_id)
        .collect();
    assert_eq!(removed, HashSet::from([Some(by_group.id), Some(by_role.id)]));

    for mapping in [by_group, by_role] {
        let stored = ctx
            .db
            .identity_sync_mappings()
            .get_by_id(ctx.org_id, mapping.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_sync_at.is_none());
    }
}

#[tokio::test]
async fn test_event_revoke_resets_any_org_role_to_member() {
    let ctx = setup(Some(StaticDirectory::default())).await;
    let user = seed_member(&ctx.db, ctx.org_id, "v@example.com", OrgRole::Viewer).await;
    let mapping = create_mapping(&ctx, "wg-admins", TargetType::OrganizationRole, "admin").await;

    let outcome = ctx
        .service
        .handle_event(
            ctx.org_id,
            &event(Some("wg-admins"), Some("v@example.com"), Some("revoked")),
        )
        .await
        .unwrap();
    assert!(outcome.processed);

    let role = ctx
        .db
        .organizations()
        .get_member(ctx.org_id, user)
        .await
        .unwrap()
        .unwrap()
        .role;
    assert_eq!(role, OrgRole::Member);

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, SyncAction::UserRemoved);
    assert_eq!(entries[0].mapping_id, Some(mapping.id));
}

#[tokio::test]
async fn test_event_mapping_failure_does_not_stop_others() {
    let ctx = setup(Some(StaticDirectory::default())).await;
    let user = seed_member(&ctx.db, ctx.org_id, "a@example.com", OrgRole::Member).await;
    let group = seed_group(&ctx.db, ctx.org_id, "eng").await;
    // Target that no longer exists
    let broken = create_mapping(&ctx, "wg-eng", TargetType::Group, &Uuid::new_v4().to_string()).await;
    let working = create_mapping(&ctx, "wg-eng", TargetType::Group, &group.to_string()).await;

    let outcome = ctx
        .service
        .handle_event(
            ctx.org_id,
            &event(Some("wg-eng"), Some("a@example.com"), Some("approved")),
        )
        .await
        .unwrap();
    assert!(outcome.processed);
    assert_eq!(group_members(&ctx, group).await, HashSet::from([user]));

    let entries = logs(&ctx).await;
    assert_eq!(entries.len(), 2);
    let failure = entries
        .iter()
        .find(|e| e.action == SyncAction::Error)
        .unwrap();
    assert_eq!(failure.mapping_id, Some(broken.id));
    assert!(failure.error.as_deref().unwrap().contains("not found"));
    let success = entries
        .iter()
        .find(|e| e.action == SyncAction::UserAdded)
        .unwrap();
    assert_eq!(success.mapping_id, Some(working.id));
}
