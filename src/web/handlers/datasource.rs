use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::datasource::DataSourceManager;
use crate::models::DataSourceConfig;
use crate::web::responses::{error_response, no_content, ok};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct CurrentDataSource {
    pub r#type: &'static str,
}

pub async fn current_data_source(State(state): State<AppState>) -> Response {
    let data_source = state.data_sources.current().await;
    ok(CurrentDataSource {
        r#type: data_source.source_type(),
    })
}

pub async fn switch_data_source(
    State(state): State<AppState>,
    Json(config): Json<DataSourceConfig>,
) -> Response {
    state.data_sources.switch(config).await;
    no_content()
}

/// `POST /api/datasource/{name}/test`: the only place an upstream
/// `DataSourceError` reaches an operator directly (spec §7) — everywhere
/// else it's logged and swallowed by the Watcher's tick. `name` identifies
/// the configuration being tested for the caller; it plays no role in the
/// probe itself, which always runs against the config in the request body.
pub async fn test_data_source(
    State(_state): State<AppState>,
    Path(_name): Path<String>,
    Json(config): Json<DataSourceConfig>,
) -> Response {
    match DataSourceManager::test(config).await {
        Ok(()) => ok(()),
        Err(err) => error_response(err),
    }
}
