//! Identity sync engine.
//!
//! Two entry points mutate local membership from the identity provider:
//! the diff path ([`IdentitySyncService::sync_mapping`] and
//! [`IdentitySyncService::sync_all`]) and the event path
//! ([`IdentitySyncService::handle_event`]). Both write every outcome to the
//! sync log.

mod events;
mod orchestrator;
mod reconcile;
#[cfg(all(test, feature = "database-sqlite"))]
mod tests;

use std::sync::Arc;

pub use reconcile::MembershipDiff;
use thiserror::Error;

use super::{sync_logs::SyncLogService, targets::TargetError, targets::TargetRegistry};
use crate::{db::DbError, db::DbPool, identity::ClientResolver, identity::IdentityError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Mapping not found")]
    MappingNotFound,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The provider client could not be built for this organization.
    #[error("Identity provider unavailable: {0}")]
    ClientUnavailable(String),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

#[derive(Clone)]
pub struct IdentitySyncService {
    db: Arc<DbPool>,
    resolver: Arc<dyn ClientResolver>,
    targets: TargetRegistry,
    audit: SyncLogService,
}

impl IdentitySyncService {
    pub fn new(
        db: Arc<DbPool>,
        resolver: Arc<dyn ClientResolver>,
        targets: TargetRegistry,
        audit: SyncLogService,
    ) -> Self {
        Self {
            db,
            resolver,
            targets,
            audit,
        }
    }
}
