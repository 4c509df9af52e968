//! Admin HTTP API server (spec §6). A thin boundary over the Store and
//! `DataSourceManager` — grounded on the teacher's `web::WebServer`, trimmed
//! to a single axum `Router` and `axum::serve` loop since this crate has no
//! web UI, relay processes, or streaming endpoints to wire up.

pub mod handlers;
pub mod responses;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::WebConfig;
use crate::database::Store;
use crate::datasource::DataSourceManager;

use handlers::AppState;

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, store: Store, data_sources: Arc<DataSourceManager>) -> Self {
        let state = AppState { store, data_sources };
        let mut app = handlers::router(state).layer(TraceLayer::new_for_http());
        if config.cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }
        let addr = SocketAddr::new(config.host.parse().expect("invalid configured web host"), config.port);
        Self { app, addr }
    }

    pub async fn serve(self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!(addr = %self.addr, "admin API listening");
        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("admin API stopping");
            })
            .await?;
        Ok(())
    }
}
