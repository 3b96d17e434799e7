use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{FallbackDirectory, IdentityProviderClient, IdentityResult, SailPointClient};
use crate::services::CredentialStore;

/// Chooses the identity provider client for an organization.
///
/// Called once per sync, event or browse request; the returned client is
/// then used for the whole operation.
#[async_trait]
pub trait ClientResolver: Send + Sync {
    async fn resolve(&self, org_id: Uuid) -> IdentityResult<Arc<dyn IdentityProviderClient>>;
}

/// Resolves to a [`SailPointClient`] when the organization has complete,
/// active credentials, and to the [`FallbackDirectory`] otherwise.
///
/// Live clients are cached per organization so their access tokens survive
/// between requests. A cached client is replaced as soon as the stored
/// credentials change.
pub struct IdentityClientResolver {
    credentials: CredentialStore,
    http: reqwest::Client,
    page_size: u32,
    clients: DashMap<Uuid, Arc<SailPointClient>>,
}

impl IdentityClientResolver {
    pub fn new(credentials: CredentialStore, http: reqwest::Client, page_size: u32) -> Self {
        Self {
            credentials,
            http,
            page_size,
            clients: DashMap::new(),
        }
    }
}

#[async_trait]
impl ClientResolver for IdentityClientResolver {
    async fn resolve(&self, org_id: Uuid) -> IdentityResult<Arc<dyn IdentityProviderClient>> {
        let Some(credentials) = self.credentials.get_active_credentials(org_id).await? else {
            self.clients.remove(&org_id);
            debug!(%org_id, "No active identity provider credentials, using fallback directory");
            return Ok(Arc::new(FallbackDirectory::new()));
        };

        if let Some(client) = self.clients.get(&org_id)
            && client.credentials() == &credentials
        {
            return Ok(client.clone());
        }

        let client = Arc::new(SailPointClient::new(
            self.http.clone(),
            credentials,
            self.page_size,
        )?);
        self.clients.insert(org_id, client.clone());
        Ok(client)
    }
}
