use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::MIDDLEWARE_TYPES;
use crate::web::responses::{created, handle_result, no_content};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMiddlewareRequest {
    pub name: String,
    pub r#type: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMiddlewareRequest {
    pub name: Option<String>,
    pub config: Option<serde_json::Value>,
}

fn validate_type(r#type: &str) -> Result<(), AppError> {
    if MIDDLEWARE_TYPES.contains(&r#type) {
        Ok(())
    } else {
        Err(AppError::validation(format!("unknown middleware type '{type}'")))
    }
}

pub async fn list_middlewares(State(state): State<AppState>) -> Response {
    handle_result(state.store.middlewares.get_all().await)
}

pub async fn get_middleware(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let result = state.store.middlewares.find_by_id(id).await.and_then(|m| {
        m.ok_or_else(|| AppError::not_found("middleware", id.to_string()))
    });
    handle_result(result)
}

pub async fn create_middleware(
    State(state): State<AppState>,
    Json(request): Json<CreateMiddlewareRequest>,
) -> Response {
    if let Err(err) = validate_type(&request.r#type) {
        return crate::web::responses::error_response(err);
    }
    match state
        .store
        .middlewares
        .create(request.name, request.r#type, request.config)
        .await
    {
        Ok(middleware) => created(middleware),
        Err(err) => crate::web::responses::error_response(err),
    }
}

pub async fn update_middleware(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMiddlewareRequest>,
) -> Response {
    handle_result(
        state
            .store
            .middlewares
            .update(id, request.name, request.config)
            .await,
    )
}

pub async fn delete_middleware(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.store.middlewares.delete(id).await {
        Ok(()) => no_content(),
        Err(err) => crate::web::responses::error_response(err),
    }
}
