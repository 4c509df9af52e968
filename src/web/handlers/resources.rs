use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::web::responses::{error_response, handle_result, no_content};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct AttachMiddlewareRequest {
    pub priority: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetCustomServiceRequest {
    pub service_id: String,
}

/// Partial update of a resource's operator-owned override columns (spec §6).
/// Every field is optional; only the ones present in the request body are
/// written, mirroring `UpdateMiddlewareRequest`/`UpdateServiceRequest`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateResourceOverridesRequest {
    pub entrypoints: Option<Vec<String>>,
    pub tls_domains: Option<Vec<String>>,
    pub tcp_enabled: Option<bool>,
    pub tcp_entrypoints: Option<Vec<String>>,
    pub tcp_sni_rule: Option<String>,
    pub custom_headers: Option<serde_json::Value>,
    pub router_priority: Option<i32>,
}

pub async fn list_resources(State(state): State<AppState>) -> Response {
    handle_result(state.store.resources.get_resources().await)
}

pub async fn attach_middleware(
    State(state): State<AppState>,
    Path((resource_id, middleware_id)): Path<(String, Uuid)>,
    Json(request): Json<AttachMiddlewareRequest>,
) -> Response {
    match state
        .store
        .resources
        .attach_middleware(&resource_id, middleware_id, request.priority)
        .await
    {
        Ok(()) => no_content(),
        Err(err) => error_response(err),
    }
}

pub async fn detach_middleware(
    State(state): State<AppState>,
    Path((resource_id, middleware_id)): Path<(String, Uuid)>,
) -> Response {
    match state
        .store
        .resources
        .detach_middleware(&resource_id, middleware_id)
        .await
    {
        Ok(()) => no_content(),
        Err(err) => error_response(err),
    }
}

pub async fn set_custom_service(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    Json(request): Json<SetCustomServiceRequest>,
) -> Response {
    match state
        .store
        .resources
        .set_custom_service(&resource_id, &request.service_id)
        .await
    {
        Ok(()) => no_content(),
        Err(err) => error_response(err),
    }
}

pub async fn clear_custom_service(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
) -> Response {
    match state.store.resources.clear_custom_service(&resource_id).await {
        Ok(()) => no_content(),
        Err(err) => error_response(err),
    }
}

pub async fn update_resource_overrides(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    Json(request): Json<UpdateResourceOverridesRequest>,
) -> Response {
    handle_result(
        state
            .store
            .resources
            .update_overrides(
                &resource_id,
                request.entrypoints,
                request.tls_domains,
                request.tcp_enabled,
                request.tcp_entrypoints,
                request.tcp_sni_rule,
                request.custom_headers,
                request.router_priority,
            )
            .await,
    )
}

pub async fn delete_resource(State(state): State<AppState>, Path(resource_id): Path<String>) -> Response {
    match state.store.resources.delete(&resource_id).await {
        Ok(()) => no_content(),
        Err(err) => error_response(err),
    }
}
