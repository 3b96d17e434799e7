//! Health check endpoint for load balancers and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// "ok" or "unhealthy"
    pub status: &'static str,
    pub version: &'static str,
    /// Latency of the database round-trip in milliseconds
    pub database_latency_ms: u64,
}

/// Returns 200 while the database answers, 503 otherwise.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = std::time::Instant::now();
    let result = state.db.health_check().await;
    let database_latency_ms = start.elapsed().as_millis() as u64;

    let (code, status) = match result {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        code,
        Json(HealthStatus {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database_latency_ms,
        }),
    )
}
