//! Live client for the SailPoint Identity Security Cloud workgroup API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{
    ClientKind, IdentityError, IdentityProviderClient, IdentityResult, filter_groups,
};
use crate::models::{ExternalGroup, ExternalMember, ProviderCredentials};

/// Refresh this long before the provider-reported expiry.
const TOKEN_GRACE_SECS: i64 = 60;

/// Upper bound on pages fetched for one listing.
const MAX_PAGES: usize = 1000;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self, grace: Duration) -> bool {
        Utc::now() + grace >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkgroupDto {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    member_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WorkgroupMemberDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

pub struct SailPointClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: ProviderCredentials,
    page_size: u32,
    token: RwLock<Option<CachedToken>>,
}

impl SailPointClient {
    pub fn new(
        http: reqwest::Client,
        credentials: ProviderCredentials,
        page_size: u32,
    ) -> IdentityResult<Self> {
        let base_url = Url::parse(&credentials.tenant_url)
            .map_err(|e| IdentityError::InvalidTenantUrl(format!("{}: {}", credentials.tenant_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(IdentityError::InvalidTenantUrl(credentials.tenant_url));
        }

        Ok(Self {
            http,
            base_url,
            credentials,
            page_size: page_size.max(1),
            token: RwLock::new(None),
        })
    }

    pub fn credentials(&self) -> &ProviderCredentials {
        &self.credentials
    }

    /// Tenant URL with `segments` appended. Each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> IdentityResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IdentityError::InvalidTenantUrl(self.credentials.tenant_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn access_token(&self) -> IdentityResult<String> {
        let grace = Duration::seconds(TOKEN_GRACE_SECS);
        {
            let cache = self.token.read().await;
            if let Some(token) = cache.as_ref()
                && !token.is_expired(grace)
            {
                return Ok(token.access_token.clone());
            }
        }

        let mut cache = self.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cache.as_ref()
            && !token.is_expired(grace)
        {
            return Ok(token.access_token.clone());
        }

        let token = self.acquire_token().await?;
        let access_token = token.access_token.clone();
        *cache = Some(token);
        Ok(access_token)
    }

    #[instrument(skip(self), fields(tenant = %self.base_url))]
    async fn acquire_token(&self) -> IdentityResult<CachedToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint(&["oauth", "token"])?)
            .form(&params)
            .send()
            .await
            .map_err(|e| IdentityError::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Auth(format!("Failed to parse token response: {}", e)))?;

        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        debug!(%expires_at, "Acquired identity provider token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at,
        })
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    /// GET a JSON document. A 401 drops the cached token and retries once.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> IdentityResult<T> {
        let mut retried = false;
        loop {
            let token = self.access_token().await?;
            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&token)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !retried {
                warn!(url = %url, "Identity provider rejected token, refreshing");
                self.invalidate_token().await;
                retried = true;
                continue;
            }

            let body = response.text().await?;
            if !status.is_success() {
                return Err(IdentityError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            return serde_json::from_str(&body).map_err(|e| IdentityError::Decode(e.to_string()));
        }
    }

    /// Follow `limit`/`offset` paging until a short page.
    ///
    /// Fails with [`IdentityError::Decode`] if the provider repeats a page or
    /// keeps returning full pages past [`MAX_PAGES`].
    async fn get_paged<T: DeserializeOwned>(&self, segments: &[&str]) -> IdentityResult<Vec<T>> {
        let mut items = Vec::new();
        let mut offset: u64 = 0;
        let mut previous: Option<Vec<serde_json::Value>> = None;

        for _ in 0..MAX_PAGES {
            let mut url = self.endpoint(segments)?;
            url.query_pairs_mut()
                .append_pair("limit", &self.page_size.to_string())
                .append_pair("offset", &offset.to_string());

            let page: Vec<serde_json::Value> = self.get_json(url).await?;
            let len = page.len();
            if len > 0 && previous.as_ref() == Some(&page) {
                return Err(IdentityError::Decode(format!(
                    "provider returned the same page again at offset {}",
                    offset
                )));
            }
            for value in &page {
                items.push(
                    serde_json::from_value(value.clone())
                        .map_err(|e| IdentityError::Decode(e.to_string()))?,
                );
            }

            if len < self.page_size as usize {
                return Ok(items);
            }
            offset += len as u64;
            previous = Some(page);
        }

        Err(IdentityError::Decode(format!(
            "provider kept returning full pages after {} requests",
            MAX_PAGES
        )))
    }
}

#[async_trait]
impl IdentityProviderClient for SailPointClient {
    #[instrument(skip(self))]
    async fn list_groups(
        &self,
        search: Option<&str>,
        limit: Option<usize>,
    ) -> IdentityResult<Vec<ExternalGroup>> {
        let groups: Vec<WorkgroupDto> = self.get_paged(&["v3", "workgroups"]).await?;
        let groups = groups.into_iter().map(|g| ExternalGroup {
            id: g.id,
            name: g.name,
            description: g.description,
            member_count: g.member_count,
        });
        Ok(filter_groups(groups, search, limit))
    }

    #[instrument(skip(self))]
    async fn list_group_members(&self, group_id: &str) -> IdentityResult<Vec<ExternalMember>> {
        let members: Vec<WorkgroupMemberDto> = self
            .get_paged(&["v3", "workgroups", group_id, "members"])
            .await?;

        let total = members.len();
        let members: Vec<ExternalMember> = members
            .into_iter()
            .filter_map(|m| {
                let email = m.email.filter(|e| !e.trim().is_empty())?;
                Some(ExternalMember {
                    id: m.id,
                    name: m.name.unwrap_or_else(|| email.clone()),
                    email,
                })
            })
            .collect();

        if members.len() < total {
            debug!(
                group_id,
                skipped = total - members.len(),
                "Skipped workgroup members without an email"
            );
        }
        Ok(members)
    }

    fn kind(&self) -> ClientKind {
        ClientKind::Live
    }
}
