use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use router_sync::config::Config;
use router_sync::database::Store;
use router_sync::datasource::DataSourceManager;
use router_sync::generator::Generator;
use router_sync::models::DataSourceConfig;
use router_sync::watcher::Watcher;
use router_sync::web::WebServer;

/// Control-plane service: discovers routable resources from an upstream
/// source of truth, reconciles them into a local store, and materializes a
/// dynamic proxy config on a schedule (spec §1-§2).
#[derive(Parser)]
#[command(name = "router-syncd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Router-sync control plane")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address (overrides config file)
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port (overrides config file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("router_sync={}", cli.log_level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting router-sync v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config).with_context(|| format!("loading config from {}", cli.config))?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    let store = Store::connect(&config.database).await.context("connecting to store")?;
    info!("store connected and migrations applied");

    let data_source_config = load_data_source_config(config.data_source_config_path.as_deref())
        .context("loading data source configuration")?;
    let data_sources = Arc::new(DataSourceManager::new(data_source_config));

    let (shutdown_tx, _) = broadcast::channel(1);

    let watcher = Watcher::new(store.clone(), data_sources.clone(), config.watcher.clone());
    let watcher_shutdown = shutdown_tx.subscribe();
    let watcher_task = tokio::spawn(watcher.run(watcher_shutdown));

    let generator = Generator::new(
        store.clone(),
        config.generator.clone(),
        config.storage.artifact_dir.clone(),
    )
    .await
    .context("initializing generator artifact sandbox")?;
    let generator_shutdown = shutdown_tx.subscribe();
    let generator_task = tokio::spawn(generator.run(generator_shutdown));

    let web_server = WebServer::new(&config.web, store.clone(), data_sources.clone());
    let web_shutdown = shutdown_tx.subscribe();
    let web_task = tokio::spawn(web_server.serve(web_shutdown));

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    let (watcher_result, generator_result, web_result) =
        tokio::join!(watcher_task, generator_task, web_task);
    watcher_result.context("watcher task panicked")?;
    generator_result.context("generator task panicked")?;
    web_result.context("web server task panicked")?.context("web server error")?;

    info!("router-sync stopped cleanly");
    Ok(())
}

fn load_data_source_config(path: Option<&std::path::Path>) -> Result<DataSourceConfig> {
    let path: PathBuf = path
        .map(PathBuf::from)
        .context("data_source_config_path is not set in configuration")?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading data source config from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing data source config from {}", path.display()))
}
