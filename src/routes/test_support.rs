//! Shared fixtures for route tests.

use std::sync::Arc;

use axum::{Router, body::Body, http::Request};
use http::StatusCode;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    AppState,
    config::AppConfig,
    db::{DbPool, tests::harness::{create_test_db, seed_org}},
    models::{CreateIdentitySyncMapping, IdentitySyncMapping, SyncDirection, TargetType},
    secrets::MemorySecretManager,
    services::Services,
};

/// App state over a fresh database with one organization. No provider
/// credentials are stored, so every organization resolves to the built-in
/// directory.
pub struct TestApp {
    pub state: AppState,
    pub db: Arc<DbPool>,
    pub org_id: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let db = Arc::new(create_test_db().await);
        let services = Services::new(
            db.clone(),
            Arc::new(MemorySecretManager::new()),
            reqwest::Client::new(),
            &config.identity_sync,
        );
        let org_id = seed_org(&db, "acme").await;
        Self {
            state: AppState {
                config: Arc::new(config),
                db: db.clone(),
                services,
            },
            db,
            org_id,
        }
    }

    pub fn router(&self) -> Router {
        super::build_app(self.state.clone())
    }

    pub async fn create_mapping(
        &self,
        external_group_id: &str,
        target_type: TargetType,
        target_id: &str,
    ) -> IdentitySyncMapping {
        self.state
            .services
            .mappings
            .create(
                self.org_id,
                CreateIdentitySyncMapping {
                    external_group_id: external_group_id.to_string(),
                    external_group_name: external_group_id.to_string(),
                    target_type,
                    target_id: target_id.to_string(),
                    role_name: None,
                    sync_direction: SyncDirection::Pull,
                },
            )
            .await
            .unwrap()
    }
}

/// Run one request through the router. Empty bodies decode to `Value::Null`,
/// non-JSON bodies (extractor rejections) to a string.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
