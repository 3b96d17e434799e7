//! Identity provider clients.
//!
//! An organization talks to its identity provider through an
//! [`IdentityProviderClient`]. [`IdentityClientResolver`] picks the
//! implementation once per call: the live [`SailPointClient`] when the
//! organization has complete, active credentials, otherwise the built-in
//! [`FallbackDirectory`]. Missing credentials are never an error.

mod fallback;
mod resolver;
mod sailpoint;

use async_trait::async_trait;
pub use fallback::FallbackDirectory;
pub use resolver::{ClientResolver, IdentityClientResolver};
pub use sailpoint::SailPointClient;
use thiserror::Error;

use crate::{
    models::{ExternalGroup, ExternalMember},
    services::CredentialError,
};

/// Failure talking to a live identity provider.
///
/// Distinct from "not configured", which selects the fallback directory instead.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid tenant URL: {0}")]
    InvalidTenantUrl(String),

    #[error("Authentication with identity provider failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode identity provider response: {0}")]
    Decode(String),

    #[error("Failed to load identity provider credentials: {0}")]
    Credentials(#[from] CredentialError),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Which implementation served a request, for logs and API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    Fallback,
    Live,
}

/// Group and member listing for one organization's identity provider.
#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    /// Groups whose name or description contains `search` (case-insensitive),
    /// at most `limit` of them.
    async fn list_groups(
        &self,
        search: Option<&str>,
        limit: Option<usize>,
    ) -> IdentityResult<Vec<ExternalGroup>>;

    async fn list_group_members(&self, group_id: &str) -> IdentityResult<Vec<ExternalMember>>;

    fn kind(&self) -> ClientKind;
}

/// Apply the shared search and limit rules to a group listing.
pub fn filter_groups(
    groups: impl IntoIterator<Item = ExternalGroup>,
    search: Option<&str>,
    limit: Option<usize>,
) -> Vec<ExternalGroup> {
    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    groups
        .into_iter()
        .filter(|group| match &needle {
            None => true,
            Some(needle) => {
                group.name.to_lowercase().contains(needle)
                    || group
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(needle))
            }
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}
