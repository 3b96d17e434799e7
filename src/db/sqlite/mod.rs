mod common;
mod groups;
mod identity_sync_configs;
mod identity_sync_mappings;
mod organizations;
mod projects;
mod sync_logs;
mod users;

pub use groups::SqliteGroupRepo;
pub use identity_sync_configs::SqliteIdentitySyncConfigRepo;
pub use identity_sync_mappings::SqliteIdentitySyncMappingRepo;
pub use organizations::SqliteOrganizationRepo;
pub use projects::SqliteProjectRepo;
pub use sync_logs::SqliteSyncLogRepo;
pub use users::SqliteUserRepo;
