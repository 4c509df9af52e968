//! Periodic scheduling loop (spec §4.3). Grounded on the teacher's
//! `ingestor::scheduler` shape — a long-lived task woken on a timer,
//! responding to a shutdown signal between ticks — simplified from the
//! teacher's per-source cron expressions to the spec's single configurable
//! fixed interval, since there is exactly one upstream to poll per tick, not
//! one schedule per source.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::WatcherConfig;
use crate::database::Store;
use crate::datasource::DataSourceManager;

use super::reconcile::{reconcile_resources, reconcile_services};

pub struct Watcher {
    store: Store,
    data_sources: Arc<DataSourceManager>,
    config: WatcherConfig,
}

impl Watcher {
    pub fn new(store: Store, data_sources: Arc<DataSourceManager>, config: WatcherConfig) -> Self {
        Self {
            store,
            data_sources,
            config,
        }
    }

    /// Runs the Watcher and the services-watcher as two independent
    /// long-lived tasks on the same interval (spec §4.3/§5: "three
    /// long-lived periodic tasks (Watcher, services-watcher, Generator)").
    /// Each subscribes to its own copy of `shutdown` and keeps its own
    /// failure domain — a services-fetch failure never skips a resource
    /// reconciliation that already succeeded, and vice versa.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) {
        let services_shutdown = shutdown.resubscribe();
        tokio::join!(
            self.run_resource_loop(shutdown),
            self.run_services_loop(services_shutdown),
        );
    }

    async fn run_resource_loop(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs = self.config.interval_secs, "watcher started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick_resources().await;
                }
                _ = shutdown.recv() => {
                    info!("watcher stopping");
                    break;
                }
            }
        }
    }

    async fn run_services_loop(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs = self.config.interval_secs, "services-watcher started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick_services().await;
                }
                _ = shutdown.recv() => {
                    info!("services-watcher stopping");
                    break;
                }
            }
        }
    }

    async fn tick_resources(&self) {
        let data_source = self.data_sources.current().await;
        let resources = match data_source.fetch_resources().await {
            Ok(resources) => resources,
            Err(err) => {
                warn!("resource fetch failed, skipping tick: {err}");
                return;
            }
        };

        let result = self
            .store
            .with_transaction(move |txn| Box::pin(reconcile_resources(txn, resources)))
            .await;
        if let Err(err) = result {
            warn!("resource reconciliation failed, rolled back: {err}");
        }
    }

    async fn tick_services(&self) {
        let data_source = self.data_sources.current().await;
        let services = match data_source.fetch_services().await {
            Ok(services) => services,
            Err(err) => {
                warn!("service fetch failed, skipping tick: {err}");
                return;
            }
        };

        let source_type = data_source.source_type();
        let result = self
            .store
            .with_transaction(move |txn| Box::pin(reconcile_services(txn, services, source_type)))
            .await;
        if let Err(err) = result {
            warn!("service reconciliation failed, rolled back: {err}");
        }
    }
}
