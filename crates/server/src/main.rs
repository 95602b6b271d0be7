//! Shelf server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use shelf_core::AppConfig;
use shelf_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shelf - a self-hosted file sharing server
#[derive(Parser, Debug)]
#[command(name = "shelfd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SHELF_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Shelf v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override
    // everything; the defaults alone are a working configuration)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!(
            "No config file found at {}, using defaults and environment",
            args.config
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SHELF_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    // The served root must exist before anything is wired to it
    let root = config.files.root.clone();
    if !root.is_dir() {
        anyhow::bail!(
            "served root {} does not exist or is not a directory; \
             create it or set files.root / SHELF_FILES__ROOT",
            root.display()
        );
    }
    tracing::info!(root = %root.display(), "Serving file tree");

    let state = AppState::new(config.clone());

    // One index build shortly after startup, then one per interval
    let _index_task = state
        .index
        .clone()
        .spawn_rebuild_task(config.index.startup_delay(), config.index.rebuild_interval());
    tracing::info!(
        interval_secs = config.index.rebuild_interval_secs,
        "Search index task spawned"
    );

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
