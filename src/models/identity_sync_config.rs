use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Stored connection settings for an organization's identity provider.
///
/// The client secret itself lives in the secret manager; only its key is
/// persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySyncConfig {
    pub id: Uuid,
    pub org_id: Uuid,
    /// Credential-store key, e.g. "identity-sync"
    pub provider: String,
    /// Base URL of the provider tenant (e.g. `https://acme.api.identitynow.com`)
    pub tenant_url: String,
    pub client_id: String,
    /// Secret manager key for the client secret
    #[serde(skip_serializing)]
    pub client_secret_key: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create or replace an organization's provider credentials.
#[derive(Clone, Deserialize, Validate)]
pub struct UpsertIdentitySyncConfig {
    #[validate(url)]
    pub tenant_url: String,
    #[validate(length(min = 1, max = 255))]
    pub client_id: String,
    #[validate(length(min = 1))]
    pub client_secret: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl std::fmt::Debug for UpsertIdentitySyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpsertIdentitySyncConfig")
            .field("tenant_url", &self.tenant_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Fully resolved, decrypted credentials for a live provider client.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub tenant_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("tenant_url", &self.tenant_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .finish()
    }
}
