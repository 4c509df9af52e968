//! Standard API response envelope (spec §6 "Admin HTTP API"). Grounded on
//! the teacher's `web::responses` module, trimmed to the category-based
//! mapping this crate's `AppError::category()` already provides instead of
//! matching every `AppError` variant by hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::{AppError, ErrorCategory};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Maps `AppError::category()` to the HTTP status taxonomy in spec §7:
/// `NotFound`->404, `Conflict`->409, `Validation`->400, `Upstream`->502
/// (test endpoint only), `Transient`->500, `Fatal`->500 (startup-only in
/// practice; an Admin API request can't actually observe it).
pub fn error_response(err: AppError) -> Response {
    let status = match err.category() {
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCategory::Transient | ErrorCategory::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::<()>::error(err.to_string()))).into_response()
}

pub fn handle_result<T: Serialize>(result: Result<T, AppError>) -> Response {
    match result {
        Ok(data) => ok(data),
        Err(err) => error_response(err),
    }
}
