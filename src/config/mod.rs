//! Layered configuration: TOML file plus environment overrides, via
//! `figment`. Grounded on the teacher's `config/mod.rs` layering
//! (`Toml::file(...).merge(Env::prefixed(...))`).

use anyhow::Result;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub watcher: WatcherConfig,
    pub generator: GeneratorConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub data_source_config_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, then apply `ROUTER_SYNC_`-prefixed
    /// environment overrides (spec §6 "Environment (selected, recognized
    /// options)").
    pub fn load(path: &str) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ROUTER_SYNC_").split("__"))
            .extract()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_watcher_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_watcher_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_interval_secs")]
    pub interval_secs: u64,
    pub output_path: PathBuf,
    #[serde(default = "default_tls_cert_resolver")]
    pub tls_cert_resolver: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_generator_interval_secs(),
            output_path: PathBuf::from("dynamic-config.yaml"),
            tls_cert_resolver: default_tls_cert_resolver(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub artifact_dir: PathBuf,
}
