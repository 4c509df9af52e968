//! Admin HTTP API route table (spec §6). Deliberately thin — handlers
//! parse/validate the request, call the Store or `DataSourceManager`
//! directly, and hand the result to `responses::handle_result`. No business
//! logic lives here; that's the Watcher/Generator/Store's job.

pub mod datasource;
pub mod health;
pub mod middlewares;
pub mod resources;
pub mod services;

use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::database::Store;
use crate::datasource::DataSourceManager;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub data_sources: Arc<DataSourceManager>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route(
            "/api/middlewares",
            get(middlewares::list_middlewares).post(middlewares::create_middleware),
        )
        .route(
            "/api/middlewares/:id",
            get(middlewares::get_middleware)
                .put(middlewares::update_middleware)
                .delete(middlewares::delete_middleware),
        )
        .route(
            "/api/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route("/api/resources", get(resources::list_resources))
        .route(
            "/api/resources/:id",
            patch(resources::update_resource_overrides).delete(resources::delete_resource),
        )
        .route(
            "/api/resources/:id/middlewares/:middleware_id",
            put(resources::attach_middleware).delete(resources::detach_middleware),
        )
        .route(
            "/api/resources/:id/service",
            put(resources::set_custom_service).delete(resources::clear_custom_service),
        )
        .route(
            "/api/datasource",
            get(datasource::current_data_source).put(datasource::switch_data_source),
        )
        .route("/api/datasource/:name/test", post(datasource::test_data_source))
        .with_state(state)
}
