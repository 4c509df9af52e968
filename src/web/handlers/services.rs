use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{ProtocolHint, SERVICE_TYPES};
use crate::web::responses::{created, error_response, handle_result, no_content};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub r#type: String,
    pub config: serde_json::Value,
    #[serde(default)]
    pub protocol_hint: Option<ProtocolHint>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub protocol_hint: Option<Option<ProtocolHint>>,
}

fn validate_type(r#type: &str) -> Result<(), AppError> {
    if SERVICE_TYPES.contains(&r#type) {
        Ok(())
    } else {
        Err(AppError::validation(format!("unknown service type '{type}'")))
    }
}

pub async fn list_services(State(state): State<AppState>) -> Response {
    handle_result(state.store.services.get_all().await)
}

pub async fn get_service(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state
        .store
        .services
        .find_by_id(&id)
        .await
        .and_then(|s| s.ok_or_else(|| AppError::not_found("service", id.clone())));
    handle_result(result)
}

/// Creates an operator-defined service (spec §4.4 step 5 only emits these
/// into the artifact). Watcher-discovered services are never reachable
/// through this endpoint — they're written by reconciliation, not the API.
pub async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> Response {
    if let Err(err) = validate_type(&request.r#type) {
        return error_response(err);
    }
    match state
        .store
        .services
        .create(request.name, request.r#type, request.config, request.protocol_hint)
        .await
    {
        Ok(service) => created(service),
        Err(err) => error_response(err),
    }
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateServiceRequest>,
) -> Response {
    handle_result(
        state
            .store
            .services
            .update(&id, request.name, request.config, request.protocol_hint)
            .await,
    )
}

pub async fn delete_service(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.services.delete(&id).await {
        Ok(()) => no_content(),
        Err(err) => error_response(err),
    }
}
