//! Runtime configuration service.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────┐
//!                 │                config-service                  │
//!   GET/PATCH     │  ┌────────┐   ┌─────────┐   ┌──────────────┐  │
//!   ──────────────┼─▶│  http  │──▶│   api   │──▶│ ConfigStore  │──┼──▶ ~/.config-service.json
//!                 │  │ server │   │  gate   │   │ keys / merge │  │
//!   ◀─────────────┼──│        │◀──│handlers │◀──│ file (atomic)│  │
//!                 │  └────────┘   └─────────┘   └──────────────┘  │
//!                 │                                               │
//!                 │  config (TOML) · observability · lifecycle    │
//!                 └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use config_service::config::overrides::parse_assignments;
use config_service::config::validation::validate_config;
use config_service::config::{load_config, ConfigError, ServiceConfig};
use config_service::lifecycle::{signals, Shutdown};
use config_service::observability::{logging, metrics};
use config_service::store::file;
use config_service::{ConfigServer, ConfigStore};

#[derive(Parser)]
#[command(name = "config-service")]
#[command(about = "Serve and update the application configuration over HTTP", long_about = None)]
struct Args {
    /// Service configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings file to serve and persist to.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Bind address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Runtime override, repeatable (e.g. --set configDialog=false).
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(settings) = args.settings {
        config.store.path = Some(settings);
    }
    let overrides = parse_assignments(args.set.iter().map(String::as_str))?;
    config.store.overrides.extend(overrides);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level)?;

    tracing::info!("config-service v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let settings_path = config
        .store
        .path
        .clone()
        .or_else(file::default_path)
        .ok_or(ConfigError::NoSettingsPath)?;
    let store = Arc::new(ConfigStore::open(settings_path, config.store.overrides.clone())?);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        settings = %store.path().display(),
        overrides = store.overrides().len(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_listener(shutdown.clone());

    let server = ConfigServer::new(config, store);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
