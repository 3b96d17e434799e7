use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{
    db::{DbError, DbPool, IdentitySyncConfigRecord},
    models::{IdentitySyncConfig, ProviderCredentials, UpsertIdentitySyncConfig},
    secrets::{SecretError, SecretManager},
};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Failed to store client secret: {0}")]
    SecretStorage(String),

    #[error("Failed to retrieve client secret: {0}")]
    SecretRetrieval(String),
}

impl From<SecretError> for CredentialError {
    fn from(e: SecretError) -> Self {
        CredentialError::SecretRetrieval(e.to_string())
    }
}

/// Per-organization identity provider credentials.
///
/// The client secret is kept in the secret manager; the database row only
/// references it by key.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<DbPool>,
    secrets: Arc<dyn SecretManager>,
    provider: String,
}

impl CredentialStore {
    pub fn new(db: Arc<DbPool>, secrets: Arc<dyn SecretManager>, provider: impl Into<String>) -> Self {
        Self {
            db,
            secrets,
            provider: provider.into(),
        }
    }

    fn secret_key(org_id: Uuid) -> String {
        format!("identity-sync/{}/client-secret", org_id)
    }

    /// Create or replace the organization's credentials.
    pub async fn upsert(
        &self,
        org_id: Uuid,
        input: UpsertIdentitySyncConfig,
    ) -> Result<IdentitySyncConfig, CredentialError> {
        let key = Self::secret_key(org_id);
        self.secrets
            .set(&key, &input.client_secret)
            .await
            .map_err(|e| CredentialError::SecretStorage(e.to_string()))?;

        let record = IdentitySyncConfigRecord {
            provider: self.provider.clone(),
            tenant_url: input.tenant_url.trim_end_matches('/').to_string(),
            client_id: input.client_id,
            client_secret_key: Some(key.clone()),
            is_active: input.is_active,
        };

        match self.db.identity_sync_configs().upsert(org_id, record).await {
            Ok(config) => Ok(config),
            Err(e) => {
                if let Err(cleanup_err) = self.secrets.delete(&key).await {
                    warn!(
                        "Failed to clean up orphaned client secret at {} after database error: {}",
                        key, cleanup_err
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Stored config without the secret.
    pub async fn get(&self, org_id: Uuid) -> Result<Option<IdentitySyncConfig>, CredentialError> {
        Ok(self
            .db
            .identity_sync_configs()
            .get(org_id, &self.provider)
            .await?)
    }

    /// Decrypted credentials, or `None` unless an active row with every
    /// field populated exists.
    pub async fn get_active_credentials(
        &self,
        org_id: Uuid,
    ) -> Result<Option<ProviderCredentials>, CredentialError> {
        let Some(config) = self.get(org_id).await? else {
            return Ok(None);
        };
        if !config.is_active
            || config.tenant_url.trim().is_empty()
            || config.client_id.trim().is_empty()
        {
            return Ok(None);
        }
        let Some(key) = config.client_secret_key.as_deref() else {
            return Ok(None);
        };

        let secret = self.secrets.get(key).await?;
        Ok(secret
            .filter(|s| !s.is_empty())
            .map(|client_secret| ProviderCredentials {
                tenant_url: config.tenant_url,
                client_id: config.client_id,
                client_secret,
            }))
    }

    /// Remove the row and its stored secret. Fails with not-found if there
    /// is no row.
    pub async fn delete(&self, org_id: Uuid) -> Result<(), CredentialError> {
        let existing = self.get(org_id).await?;
        self.db
            .identity_sync_configs()
            .delete(org_id, &self.provider)
            .await?;

        if let Some(key) = existing.and_then(|c| c.client_secret_key)
            && let Err(e) = self.secrets.delete(&key).await
        {
            warn!("Failed to delete client secret at {}: {}", key, e);
        }
        Ok(())
    }
}
