use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_valid::Valid;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    AdminError,
    pagination::{ListQuery, PaginationMeta},
};
use crate::{
    AppState,
    identity::ClientKind,
    models::{
        CreateIdentitySyncMapping, ExternalGroup, FullSyncReport, IdentitySyncConfig,
        IdentitySyncMapping, SyncCounts, SyncLog, SyncLogQuery, UpsertIdentitySyncConfig,
    },
};

const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
pub struct MappingListResponse {
    pub data: Vec<IdentitySyncMapping>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct SyncLogListResponse {
    pub data: Vec<SyncLog>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Deserialize)]
pub struct SyncLogListQuery {
    /// Only entries attached to this mapping
    pub mapping_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub direction: Option<String>,
}

impl SyncLogListQuery {
    fn split(self) -> (SyncLogQuery, ListQuery) {
        (
            SyncLogQuery {
                mapping_id: self.mapping_id,
            },
            ListQuery {
                limit: self.limit,
                cursor: self.cursor,
                direction: self.direction,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct GroupSearchQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    pub data: Vec<ExternalGroup>,
    /// Whether the groups came from the live provider or the built-in directory
    pub source: ClientKind,
}

async fn require_org(state: &AppState, org_id: Uuid) -> Result<(), AdminError> {
    state
        .db
        .organizations()
        .get_by_id(org_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AdminError::NotFound(format!("Organization '{}' not found", org_id)))
}

#[tracing::instrument(name = "admin.identity_sync.list_mappings", skip(state, query))]
pub async fn list_mappings(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MappingListResponse>, AdminError> {
    require_org(&state, org_id).await?;

    let params = query.try_into_params()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let result = state.services.mappings.list(org_id, params).await?;

    Ok(Json(MappingListResponse {
        data: result.items,
        pagination: PaginationMeta::with_cursors(
            limit,
            result.has_more,
            result.cursors.next.map(|c| c.encode()),
            result.cursors.prev.map(|c| c.encode()),
        ),
    }))
}

#[tracing::instrument(name = "admin.identity_sync.create_mapping", skip(state, input))]
pub async fn create_mapping(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Valid(Json(input)): Valid<Json<CreateIdentitySyncMapping>>,
) -> Result<(StatusCode, Json<IdentitySyncMapping>), AdminError> {
    require_org(&state, org_id).await?;
    let mapping = state.services.mappings.create(org_id, input).await?;
    Ok((StatusCode::CREATED, Json(mapping)))
}

#[tracing::instrument(name = "admin.identity_sync.delete_mapping", skip(state))]
pub async fn delete_mapping(
    State(state): State<AppState>,
    Path((org_id, mapping_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AdminError> {
    state.services.mappings.delete(org_id, mapping_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "admin.identity_sync.sync_mapping", skip(state))]
pub async fn sync_mapping(
    State(state): State<AppState>,
    Path((org_id, mapping_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SyncCounts>, AdminError> {
    let counts = state
        .services
        .identity_sync
        .sync_mapping(org_id, mapping_id)
        .await?;
    Ok(Json(counts))
}

#[tracing::instrument(name = "admin.identity_sync.sync_all", skip(state))]
pub async fn sync_all(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<FullSyncReport>, AdminError> {
    require_org(&state, org_id).await?;
    let report = state.services.identity_sync.sync_all(org_id).await?;
    Ok(Json(report))
}

#[tracing::instrument(name = "admin.identity_sync.list_logs", skip(state, query))]
pub async fn list_logs(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<SyncLogListQuery>,
) -> Result<Json<SyncLogListResponse>, AdminError> {
    require_org(&state, org_id).await?;

    let (filter, list) = query.split();
    let params = list.try_into_params()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let result = state.services.sync_logs.list(org_id, filter, params).await?;

    Ok(Json(SyncLogListResponse {
        data: result.items,
        pagination: PaginationMeta::with_cursors(
            limit,
            result.has_more,
            result.cursors.next.map(|c| c.encode()),
            result.cursors.prev.map(|c| c.encode()),
        ),
    }))
}

/// Browse the organization's identity provider groups.
#[tracing::instrument(name = "admin.identity_sync.list_groups", skip(state, query))]
pub async fn list_groups(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<GroupSearchQuery>,
) -> Result<Json<GroupListResponse>, AdminError> {
    require_org(&state, org_id).await?;

    let client = state.services.resolver.resolve(org_id).await?;
    let groups = client
        .list_groups(query.search.as_deref(), query.limit)
        .await?;

    Ok(Json(GroupListResponse {
        data: groups,
        source: client.kind(),
    }))
}

#[tracing::instrument(name = "admin.identity_sync.get_config", skip(state))]
pub async fn get_config(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<IdentitySyncConfig>, AdminError> {
    state
        .services
        .credentials
        .get(org_id)
        .await?
        .map(Json)
        .ok_or_else(|| AdminError::NotFound("Identity sync config not found".to_string()))
}

/// Create or replace provider credentials. The secret is never returned.
#[tracing::instrument(name = "admin.identity_sync.put_config", skip(state, input))]
pub async fn put_config(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Valid(Json(input)): Valid<Json<UpsertIdentitySyncConfig>>,
) -> Result<Json<IdentitySyncConfig>, AdminError> {
    require_org(&state, org_id).await?;
    let config = state.services.credentials.upsert(org_id, input).await?;
    Ok(Json(config))
}

#[tracing::instrument(name = "admin.identity_sync.delete_config", skip(state))]
pub async fn delete_config(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<StatusCode, AdminError> {
    state.services.credentials.delete(org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use serde_json::json;

    use crate::{
        db::tests::harness::{seed_group, seed_member},
        models::{OrgRole, TargetType},
        routes::test_support::{TestApp, empty_request, json_request, send},
    };

    fn base(app: &TestApp) -> String {
        format!("/admin/v1/organizations/{}/identity-sync", app.org_id)
    }

    #[tokio::test]
    async fn test_mapping_lifecycle() {
        let app = TestApp::new().await;
        let group_id = seed_group(&app.db, app.org_id, "Engineering").await;

        let (status, created) = send(
            app.router(),
            json_request(
                "POST",
                &format!("{}/mappings", base(&app)),
                json!({
                    "external_group_id": "wg-engineering",
                    "external_group_name": "Engineering",
                    "target_type": "group",
                    "target_id": group_id.to_string(),
                }),
            ),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(created["target_type"], "group");
        assert_eq!(created["sync_direction"], "pull");
        let mapping_id = created["id"].as_str().unwrap().to_string();

        let (status, list) = send(
            app.router(),
            empty_request("GET", &format!("{}/mappings", base(&app))),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(list["data"].as_array().unwrap().len(), 1);
        assert_eq!(list["pagination"]["has_more"], false);

        let uri = format!("{}/mappings/{}", base(&app), mapping_id);
        let (status, _) = send(app.router(), empty_request("DELETE", &uri)).await;
        assert_eq!(status, 204);
        let (status, body) = send(app.router(), empty_request("DELETE", &uri)).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_create_mapping_rejects_invalid_targets() {
        let app = TestApp::new().await;

        let (status, body) = send(
            app.router(),
            json_request(
                "POST",
                &format!("{}/mappings", base(&app)),
                json!({
                    "external_group_id": "wg-platform-admins",
                    "external_group_name": "Platform Admins",
                    "target_type": "organizationRole",
                    "target_id": "superadmin",
                }),
            ),
        )
        .await;
        assert_eq!(status, 400);
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("Valid roles: admin, member, viewer")
        );

        let (status, _) = send(
            app.router(),
            json_request(
                "POST",
                &format!("{}/mappings", base(&app)),
                json!({
                    "external_group_id": "",
                    "external_group_name": "Nameless",
                    "target_type": "organizationRole",
                    "target_id": "admin",
                }),
            ),
        )
        .await;
        assert_eq!(status, 400);

        let (_, list) = send(
            app.router(),
            empty_request("GET", &format!("{}/mappings", base(&app))),
        )
        .await;
        assert!(list["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_mapping_and_logs() {
        let app = TestApp::new().await;
        let alice = seed_member(&app.db, app.org_id, "alice@example.com", OrgRole::Member).await;
        let mapping = app
            .create_mapping("wg-platform-admins", TargetType::OrganizationRole, "admin")
            .await;

        let (status, counts) = send(
            app.router(),
            empty_request(
                "POST",
                &format!("{}/mappings/{}/sync", base(&app), mapping.id),
            ),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(counts, json!({"added": 1, "removed": 0}));

        let member = app
            .db
            .organizations()
            .get_member(app.org_id, alice)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.role, OrgRole::Admin);

        let (status, logs) = send(
            app.router(),
            empty_request(
                "GET",
                &format!("{}/logs?mapping_id={}&limit=10", base(&app), mapping.id),
            ),
        )
        .await;
        assert_eq!(status, 200);
        let entries = logs["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "group_synced");
        assert_eq!(entries[0]["details"]["added"], 1);
        assert_eq!(logs["pagination"]["limit"], 10);
    }

    #[tokio::test]
    async fn test_sync_unknown_mapping_is_not_found() {
        let app = TestApp::new().await;
        let (status, _) = send(
            app.router(),
            empty_request(
                "POST",
                &format!("{}/mappings/{}/sync", base(&app), uuid::Uuid::new_v4()),
            ),
        )
        .await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_sync_all_reports_totals() {
        let app = TestApp::new().await;
        let group_id = seed_group(&app.db, app.org_id, "Finance").await;
        seed_member(&app.db, app.org_id, "dave@example.com", OrgRole::Member).await;
        seed_member(&app.db, app.org_id, "erin@example.com", OrgRole::Member).await;
        app.create_mapping("wg-finance", TargetType::Group, &group_id.to_string())
            .await;

        let (status, report) = send(
            app.router(),
            empty_request("POST", &format!("{}/sync", base(&app))),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(
            report,
            json!({"total_added": 2, "total_removed": 0, "errors": []})
        );
    }

    #[tokio::test]
    async fn test_list_groups_uses_builtin_directory() {
        let app = TestApp::new().await;
        let (status, body) = send(
            app.router(),
            empty_request("GET", &format!("{}/groups?search=ENGINEER", base(&app))),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["source"], "fallback");
        let groups = body["data"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["id"], "wg-engineering");
    }

    #[tokio::test]
    async fn test_config_lifecycle_hides_secret() {
        let app = TestApp::new().await;
        let uri = format!("{}/config", base(&app));

        let (status, _) = send(app.router(), empty_request("GET", &uri)).await;
        assert_eq!(status, 404);

        let (status, saved) = send(
            app.router(),
            json_request(
                "PUT",
                &uri,
                json!({
                    "tenant_url": "https://acme.api.identitynow.com/",
                    "client_id": "client-1",
                    "client_secret": "hunter2",
                }),
            ),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(saved["tenant_url"], "https://acme.api.identitynow.com");
        assert_eq!(saved["is_active"], true);
        assert!(saved.get("client_secret").is_none());
        assert!(saved.get("client_secret_key").is_none());

        let (status, fetched) = send(app.router(), empty_request("GET", &uri)).await;
        assert_eq!(status, 200);
        assert_eq!(fetched["client_id"], "client-1");

        let (status, _) = send(app.router(), empty_request("DELETE", &uri)).await;
        assert_eq!(status, 204);
        let (status, _) = send(app.router(), empty_request("GET", &uri)).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_config_rejects_invalid_url() {
        let app = TestApp::new().await;
        let (status, _) = send(
            app.router(),
            json_request(
                "PUT",
                &format!("{}/config", base(&app)),
                json!({"tenant_url": "not a url", "client_id": "c", "client_secret": "s"}),
            ),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_unknown_org_is_not_found() {
        let app = TestApp::new().await;
        let (status, _) = send(
            app.router(),
            empty_request(
                "GET",
                &format!(
                    "/admin/v1/organizations/{}/identity-sync/mappings",
                    uuid::Uuid::new_v4()
                ),
            ),
        )
        .await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_bad_cursor_is_rejected() {
        let app = TestApp::new().await;
        let (status, body) = send(
            app.router(),
            empty_request("GET", &format!("{}/logs?cursor=not-a-cursor", base(&app))),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_limit_is_bounded() {
        let app = TestApp::new().await;

        for path in ["mappings", "logs"] {
            for bad in ["0", "-1"] {
                let (status, body) = send(
                    app.router(),
                    empty_request("GET", &format!("{}/{}?limit={}", base(&app), path, bad)),
                )
                .await;
                assert_eq!(status, 400, "{} limit={}", path, bad);
                assert_eq!(body["error"]["code"], "bad_request");
            }

            let (status, body) = send(
                app.router(),
                empty_request(
                    "GET",
                    &format!("{}/{}?limit=9223372036854775807", base(&app), path),
                ),
            )
            .await;
            assert_eq!(status, 200);
            assert_eq!(body["pagination"]["limit"], 1000);
        }
    }
}
