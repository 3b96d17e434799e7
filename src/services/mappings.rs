use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::targets::{TargetError, TargetRegistry};
use crate::{
    db::{DbError, DbPool, ListParams, ListResult},
    models::{CreateIdentitySyncMapping, IdentitySyncMapping},
};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Mapping not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<DbError> for MappingError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => MappingError::NotFound,
            DbError::Conflict(msg) => MappingError::Conflict(msg),
            DbError::Validation(msg) => MappingError::Validation(msg),
            other => MappingError::Database(other),
        }
    }
}

impl From<TargetError> for MappingError {
    fn from(e: TargetError) -> Self {
        match e {
            TargetError::Database(e) => e.into(),
            other => MappingError::Validation(other.to_string()),
        }
    }
}

/// Mapping store: admin-facing CRUD over identity sync mappings.
#[derive(Clone)]
pub struct MappingService {
    db: Arc<DbPool>,
    targets: TargetRegistry,
}

impl MappingService {
    pub fn new(db: Arc<DbPool>, targets: TargetRegistry) -> Self {
        Self { db, targets }
    }

    /// Create a mapping after validating the input and its target.
    ///
    /// Nothing is written unless the target exists in the organization (or,
    /// for organization roles, names a valid role).
    #[tracing::instrument(skip(self, input), fields(target_type = %input.target_type))]
    pub async fn create(
        &self,
        org_id: Uuid,
        input: CreateIdentitySyncMapping,
    ) -> Result<IdentitySyncMapping, MappingError> {
        input
            .validate()
            .map_err(|e| MappingError::Validation(e.to_string()))?;

        let target_id = input.target_id.trim().to_string();
        self.targets
            .get(input.target_type)
            .validate(org_id, &target_id)
            .await?;

        let mapping = self
            .db
            .identity_sync_mappings()
            .create(
                org_id,
                CreateIdentitySyncMapping {
                    target_id,
                    ..input
                },
            )
            .await?;

        info!(
            mapping_id = %mapping.id,
            external_group_id = %mapping.external_group_id,
            "Created identity sync mapping"
        );
        Ok(mapping)
    }

    pub async fn get(&self, org_id: Uuid, id: Uuid) -> Result<IdentitySyncMapping, MappingError> {
        self.db
            .identity_sync_mappings()
            .get_by_id(org_id, id)
            .await?
            .ok_or(MappingError::NotFound)
    }

    pub async fn list(
        &self,
        org_id: Uuid,
        params: ListParams,
    ) -> Result<ListResult<IdentitySyncMapping>, MappingError> {
        Ok(self
            .db
            .identity_sync_mappings()
            .list_by_org(org_id, params)
            .await?)
    }

    /// Fails with [`MappingError::NotFound`] if the organization does not own
    /// the mapping.
    pub async fn delete(&self, org_id: Uuid, id: Uuid) -> Result<(), MappingError> {
        self.db.identity_sync_mappings().delete(org_id, id).await?;
        info!(mapping_id = %id, "Deleted identity sync mapping");
        Ok(())
    }
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use super::*;
    use crate::{
        db::tests::harness::{create_test_db, seed_group, seed_org, seed_project_role},
        models::{SyncDirection, TargetType},
    };

    fn input(target_type: TargetType, target_id: &str) -> CreateIdentitySyncMapping {
        CreateIdentitySyncMapping {
            external_group_id: "wg-engineering".into(),
            external_group_name: "Engineering".into(),
            target_type,
            target_id: target_id.into(),
            role_name: None,
            sync_direction: SyncDirection::Pull,
        }
    }

    async fn setup() -> (Arc<DbPool>, MappingService, Uuid) {
        let db = Arc::new(create_test_db().await);
        let org_id = seed_org(&db, "acme").await;
        let service = MappingService::new(db.clone(), TargetRegistry::new(db.clone()));
        (db, service, org_id)
    }

    #[tokio::test]
    async fn test_create_validates_existing_targets() {
        let (db, service, org_id) = setup().await;
        let group = seed_group(&db, org_id, "eng").await;
        let role = seed_project_role(&db, org_id, "developer").await;

        let m = service
            .create(org_id, input(TargetType::Group, &group.to_string()))
            .await
            .unwrap();
        assert_eq!(m.target_id, group.to_string());
        assert!(m.last_sync_at.is_none());

        service
            .create(org_id, input(TargetType::ProjectRole, &role.to_string()))
            .await
            .unwrap();
        service
            .create(org_id, input(TargetType::OrganizationRole, "admin"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_org_role_fails_before_persistence() {
        let (db, service, org_id) = setup().await;

        let err = service
            .create(org_id, input(TargetType::OrganizationRole, "superadmin"))
            .await
            .unwrap_err();
        match err {
            MappingError::Validation(msg) => {
                assert!(msg.contains("superadmin"));
                assert!(msg.contains("admin, member, viewer"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(
            db.identity_sync_mappings()
                .list_all_by_org(org_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_missing_target_names_type_and_id() {
        let (db, service, org_id) = setup().await;
        let missing = Uuid::new_v4().to_string();

        let err = service
            .create(org_id, input(TargetType::ProjectRole, &missing))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, MappingError::Validation(msg) if msg == &format!("projectRole {} not found", missing))
        );

        let err = service
            .create(org_id, input(TargetType::Group, &missing))
            .await
            .unwrap_err();
        assert!(matches!(&err, MappingError::Validation(msg) if msg.starts_with("group ")));
        assert!(
            db.identity_sync_mappings()
                .list_all_by_org(org_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let (_db, service, org_id) = setup().await;
        service
            .create(org_id, input(TargetType::OrganizationRole, "viewer"))
            .await
            .unwrap();
        let err = service
            .create(org_id, input(TargetType::OrganizationRole, "viewer"))
            .await
            .unwrap_err();
        assert!(matches!(err, MappingError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_is_tenant_scoped() {
        let (db, service, org_a) = setup().await;
        let org_b = seed_org(&db, "other").await;
        let owned_by_b = service
            .create(org_b, input(TargetType::OrganizationRole, "admin"))
            .await
            .unwrap();

        let err = service.delete(org_a, owned_by_b.id).await.unwrap_err();
        assert!(matches!(err, MappingError::NotFound));
        assert!(service.get(org_b, owned_by_b.id).await.is_ok());

        service.delete(org_b, owned_by_b.id).await.unwrap();
        assert!(matches!(
            service.get(org_b, owned_by_b.id).await,
            Err(MappingError::NotFound)
        ));
    }
}
