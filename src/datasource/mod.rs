//! Uniform read interface over the two upstream discovery shapes (spec
//! §4.2), grounded on the teacher's `sources::traits::SourceHandler` /
//! `sources::factory::SourceHandlerFactory` split between a narrow trait
//! and a factory that builds concrete handlers from configuration.

pub mod manager;
pub mod platform;
pub mod proxy;

use async_trait::async_trait;

use crate::errors::DataSourceError;
use crate::models::{DiscoveredResource, DiscoveredService};

pub use manager::DataSourceManager;
pub use platform::PlatformDataSource;
pub use proxy::ProxyDataSource;

/// A handle over one upstream discovery backend. Implementations fetch the
/// full resource/service inventory on demand; the Watcher calls both once
/// per tick and treats any error as "skip this tick, do not touch the
/// store" (spec §4.3 step 1).
#[async_trait]
pub trait DataSource: Send + Sync {
    fn source_type(&self) -> &'static str;

    async fn fetch_resources(&self) -> Result<Vec<DiscoveredResource>, DataSourceError>;

    async fn fetch_services(&self) -> Result<Vec<DiscoveredService>, DataSourceError>;

    /// Bounded connectivity probe backing `POST /api/datasource/{name}/test`
    /// (spec §4.2 "Autodiscovery probe").
    async fn probe(&self) -> Result<(), DataSourceError>;
}
