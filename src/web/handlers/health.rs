use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use super::AppState;
use crate::web::responses::ok;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    status: &'static str,
}

pub async fn healthz(State(_state): State<AppState>) -> Response {
    ok(HealthStatus { status: "ok" })
}
