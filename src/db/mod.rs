mod error;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, feature = "database-sqlite"))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    organizations: Arc<dyn OrganizationRepo>,
    users: Arc<dyn UserRepo>,
    groups: Arc<dyn GroupRepo>,
    projects: Arc<dyn ProjectRepo>,
    identity_sync_mappings: Arc<dyn IdentitySyncMappingRepo>,
    identity_sync_configs: Arc<dyn IdentitySyncConfigRepo>,
    sync_logs: Arc<dyn SyncLogRepo>,
}

#[cfg(feature = "database-sqlite")]
impl CachedRepos {
    fn sqlite(pool: &sqlx::SqlitePool) -> Self {
        Self {
            organizations: Arc::new(sqlite::SqliteOrganizationRepo::new(pool.clone())),
            users: Arc::new(sqlite::SqliteUserRepo::new(pool.clone())),
            groups: Arc::new(sqlite::SqliteGroupRepo::new(pool.clone())),
            projects: Arc::new(sqlite::SqliteProjectRepo::new(pool.clone())),
            identity_sync_mappings: Arc::new(sqlite::SqliteIdentitySyncMappingRepo::new(
                pool.clone(),
            )),
            identity_sync_configs: Arc::new(sqlite::SqliteIdentitySyncConfigRepo::new(
                pool.clone(),
            )),
            sync_logs: Arc::new(sqlite::SqliteSyncLogRepo::new(pool.clone())),
        }
    }
}

enum PoolStorage {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(not(feature = "database-sqlite"))]
    _None(std::convert::Infallible),
}

/// Database pool with repositories cached at construction time.
pub struct DbPool {
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        DbPool {
            repos: CachedRepos::sqlite(&pool),
            inner: PoolStorage::Sqlite(pool),
        }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .foreign_keys(true)
                            .journal_mode(if cfg.wal_mode {
                                sqlx::sqlite::SqliteJournalMode::Wal
                            } else {
                                sqlx::sqlite::SqliteJournalMode::Delete
                            })
                            .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                    )
                    .await?;

                tracing::debug!(path = %cfg.path, "Opened SQLite database");
                Ok(Self::from_sqlite(pool))
            }
        }
    }

    /// Run database migrations using sqlx's migration runner.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Running SQLite migrations");
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite migrations completed successfully");
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    pub fn organizations(&self) -> Arc<dyn OrganizationRepo> {
        Arc::clone(&self.repos.organizations)
    }

    pub fn users(&self) -> Arc<dyn UserRepo> {
        Arc::clone(&self.repos.users)
    }

    pub fn groups(&self) -> Arc<dyn GroupRepo> {
        Arc::clone(&self.repos.groups)
    }

    pub fn projects(&self) -> Arc<dyn ProjectRepo> {
        Arc::clone(&self.repos.projects)
    }

    pub fn identity_sync_mappings(&self) -> Arc<dyn IdentitySyncMappingRepo> {
        Arc::clone(&self.repos.identity_sync_mappings)
    }

    pub fn identity_sync_configs(&self) -> Arc<dyn IdentitySyncConfigRepo> {
        Arc::clone(&self.repos.identity_sync_configs)
    }

    pub fn sync_logs(&self) -> Arc<dyn SyncLogRepo> {
        Arc::clone(&self.repos.sync_logs)
    }

    /// Health check for database connectivity
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }
}
