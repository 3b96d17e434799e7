mod error;
pub mod identity_sync;
mod pagination;

use axum::{
    Router,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    routing::{get, post},
};
pub use error::{AdminError, ErrorResponse};
pub use pagination::{ListQuery, PaginationMeta};
use subtle::ConstantTimeEq;

use crate::AppState;

pub fn get_admin_routes() -> Router<AppState> {
    Router::new().nest("/v1", admin_v1_routes())
}

fn admin_v1_routes() -> Router<AppState> {
    let base = "/organizations/{org_id}/identity-sync";
    Router::new()
        .route(
            &format!("{base}/mappings"),
            get(identity_sync::list_mappings).post(identity_sync::create_mapping),
        )
        .route(
            &format!("{base}/mappings/{{mapping_id}}"),
            axum::routing::delete(identity_sync::delete_mapping),
        )
        .route(
            &format!("{base}/mappings/{{mapping_id}}/sync"),
            post(identity_sync::sync_mapping),
        )
        .route(&format!("{base}/sync"), post(identity_sync::sync_all))
        .route(&format!("{base}/logs"), get(identity_sync::list_logs))
        .route(&format!("{base}/groups"), get(identity_sync::list_groups))
        .route(
            &format!("{base}/config"),
            get(identity_sync::get_config)
                .put(identity_sync::put_config)
                .delete(identity_sync::delete_config),
        )
}

/// Requires `Authorization: Bearer {server.admin_token}` when a token is
/// configured; passes everything through otherwise.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AdminError> {
    let Some(expected) = state.config.server.admin_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    // Constant-time comparison to prevent timing attacks
    let authorized = provided
        .map(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())))
        .unwrap_or(false);

    if !authorized {
        tracing::debug!("Rejected admin request with missing or invalid token");
        return Err(AdminError::Unauthorized);
    }
    Ok(next.run(req).await)
}
