mod credentials;
pub mod identity_sync;
mod mappings;
mod sync_logs;
pub mod targets;

use std::sync::Arc;

pub use credentials::{CredentialError, CredentialStore};
pub use identity_sync::{IdentitySyncService, MembershipDiff, SyncError};
pub use mappings::{MappingError, MappingService};
pub use sync_logs::SyncLogService;
pub use targets::{TargetAdapter, TargetError, TargetRegistry};

use crate::{
    config::IdentitySyncSettings,
    db::DbPool,
    identity::{ClientResolver, IdentityClientResolver},
    secrets::SecretManager,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub mappings: MappingService,
    pub sync_logs: SyncLogService,
    pub credentials: CredentialStore,
    pub identity_sync: IdentitySyncService,
    pub resolver: Arc<dyn ClientResolver>,
}

impl Services {
    pub fn new(
        db: Arc<DbPool>,
        secrets: Arc<dyn SecretManager>,
        http: reqwest::Client,
        settings: &IdentitySyncSettings,
    ) -> Self {
        let credentials = CredentialStore::new(db.clone(), secrets, settings.provider.clone());
        let resolver: Arc<dyn ClientResolver> = Arc::new(IdentityClientResolver::new(
            credentials.clone(),
            http,
            settings.page_size,
        ));
        Self::with_resolver(db, credentials, resolver)
    }

    /// Build services around a caller-supplied client resolver.
    pub fn with_resolver(
        db: Arc<DbPool>,
        credentials: CredentialStore,
        resolver: Arc<dyn ClientResolver>,
    ) -> Self {
        let targets = TargetRegistry::new(db.clone());
        let sync_logs = SyncLogService::new(db.clone());
        Self {
            mappings: MappingService::new(db.clone(), targets.clone()),
            identity_sync: IdentitySyncService::new(
                db,
                resolver.clone(),
                targets,
                sync_logs.clone(),
            ),
            sync_logs,
            credentials,
            resolver,
        }
    }
}
