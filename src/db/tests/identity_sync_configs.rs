//! Shared tests for IdentitySyncConfigRepo implementations

use super::harness::seed_org;
use crate::db::{DbPool, error::DbError, repos::IdentitySyncConfigRecord};

fn record(client_id: &str, active: bool) -> IdentitySyncConfigRecord {
    IdentitySyncConfigRecord {
        provider: "identity-sync".to_string(),
        tenant_url: "https://acme.example.com".to_string(),
        client_id: client_id.to_string(),
        client_secret_key: Some("identity-sync/acme/client-secret".to_string()),
        is_active: active,
    }
}

pub async fn test_upsert_replaces(db: &DbPool) {
    let org_id = seed_org(db, "acme").await;
    let repo = db.identity_sync_configs();

    let first = repo.upsert(org_id, record("client-1", true)).await.unwrap();
    let second = repo.upsert(org_id, record("client-2", false)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.client_id, "client-2");
    assert!(!second.is_active);

    let stored = repo.get(org_id, "identity-sync").await.unwrap().unwrap();
    assert_eq!(stored.client_id, "client-2");
    assert!(repo.get(org_id, "other").await.unwrap().is_none());
}

pub async fn test_delete(db: &DbPool) {
    let org_id = seed_org(db, "acme").await;
    let repo = db.identity_sync_configs();

    repo.upsert(org_id, record("client-1", true)).await.unwrap();
    repo.delete(org_id, "identity-sync").await.unwrap();
    assert!(repo.get(org_id, "identity-sync").await.unwrap().is_none());
    assert!(matches!(
        repo.delete(org_id, "identity-sync").await,
        Err(DbError::NotFound)
    ));
}

mod sqlite_tests {
    sqlite_test!(test_upsert_replaces);
    sqlite_test!(test_delete);
}
