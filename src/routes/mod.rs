pub mod admin;
pub mod health;
pub mod webhooks;

#[cfg(all(test, feature = "database-sqlite"))]
pub(crate) mod test_support;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::AppState;

/// Assemble the HTTP surface: health, the provider webhook and the admin API.
pub fn build_app(state: AppState) -> Router {
    let admin_routes = admin::get_admin_routes().route_layer(
        axum::middleware::from_fn_with_state(state.clone(), admin::admin_auth_middleware),
    );

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/webhooks/identity-sync/{org_id}",
            post(webhooks::identity_sync_event),
        )
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(
            state.config.server.body_limit_bytes,
        ))
        .with_state(state)
}
