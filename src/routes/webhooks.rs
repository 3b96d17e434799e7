//! Inbound identity provider events.
//!
//! `POST /webhooks/identity-sync/{org_id}` applies a single access change
//! (approval or revocation) to every mapping of the referenced group. When a
//! webhook secret is configured the raw body must carry a hex HMAC-SHA256
//! signature in the configured header.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    AppState,
    models::{EventOutcome, IdentityEvent},
    routes::admin::AdminError,
};

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body`.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a signature header value. Accepts an optional `sha256=` prefix.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let provided = signature.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    let expected = sign_payload(secret, body);
    bool::from(
        expected
            .as_bytes()
            .ct_eq(provided.to_ascii_lowercase().as_bytes()),
    )
}

#[tracing::instrument(name = "webhooks.identity_sync", skip(state, headers, body))]
pub async fn identity_sync_event(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EventOutcome>, AdminError> {
    let webhook = &state.config.identity_sync.webhook;
    if let Some(secret) = webhook.secret.as_deref() {
        let signature = headers
            .get(webhook.signature_header.as_str())
            .and_then(|v| v.to_str().ok());
        let valid = signature.is_some_and(|sig| verify_signature(secret, &body, sig));
        if !valid {
            tracing::warn!(%org_id, "Rejected identity event with missing or invalid signature");
            return Err(AdminError::Unauthorized);
        }
    }

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AdminError::BadRequest(format!("Invalid event payload: {}", e)))?;

    if state.db.organizations().get_by_id(org_id).await?.is_none() {
        return Err(AdminError::NotFound(format!(
            "Organization '{}' not found",
            org_id
        )));
    }

    let outcome = state
        .services
        .identity_sync
        .handle_event(org_id, &event)
        .await?;
    Ok(Json(outcome))
}
