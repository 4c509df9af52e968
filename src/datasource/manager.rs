//! Holds the active data-source selection and hot-swaps it when the
//! operator changes it (spec §4.2 "Switching"). Guarded by a single
//! `RwLock`, matching the `PluginContext`-style discipline described in
//! spec §5 for the one piece of process-wide mutable state besides the
//! config path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::DataSourceConfig;
use crate::models::DataSourceType;

use super::{DataSource, PlatformDataSource, ProxyDataSource};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct DataSourceManager {
    active: RwLock<Arc<dyn DataSource>>,
}

impl DataSourceManager {
    pub fn new(config: DataSourceConfig) -> Self {
        Self {
            active: RwLock::new(build(config)),
        }
    }

    /// Returns a snapshot of the currently active source. The Watcher calls
    /// this once per tick; any in-flight fetch started before a swap is not
    /// cancelled (spec §4.2).
    pub async fn current(&self) -> Arc<dyn DataSource> {
        self.active.read().await.clone()
    }

    /// Atomically replaces the active data source.
    pub async fn switch(&self, config: DataSourceConfig) {
        let next = build(config);
        let mut guard = self.active.write().await;
        *guard = next;
    }

    pub async fn probe(&self) -> Result<(), AppError> {
        self.current()
            .await
            .probe()
            .await
            .map_err(AppError::DataSource)
    }

    /// Probes `config` without touching the active selection (spec §6:
    /// `POST /api/datasource/{name}/test` "performs a synchronous
    /// connectivity probe against the supplied configuration").
    pub async fn test(config: DataSourceConfig) -> Result<(), AppError> {
        build(config).probe().await.map_err(AppError::DataSource)
    }
}

fn build(config: DataSourceConfig) -> Arc<dyn DataSource> {
    match config.r#type {
        DataSourceType::Platform => Arc::new(PlatformDataSource::new(
            config.url,
            config.basic_auth,
            DEFAULT_PROBE_TIMEOUT,
        )),
        DataSourceType::Proxy => Arc::new(ProxyDataSource::new(
            config.url,
            config.basic_auth,
            DEFAULT_PROBE_TIMEOUT,
        )),
    }
}
