use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blob_gateway::{application::builder::ApplicationBuilder, Config};

/// Content-addressed blob storage gateway
#[derive(Parser, Debug)]
#[command(name = "blob-gateway", version)]
struct Cli {
    /// Bind address for the HTTP server
    #[arg(long)]
    http: Option<String>,

    /// Config file path; skipped when the file does not exist
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with structured logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let cli = Cli::parse();
    info!("Starting blob gateway service");

    let config_file = if cli.config.exists() {
        Some(cli.config.as_path())
    } else {
        warn!("Config file {:?} not found, using defaults", cli.config);
        None
    };
    let mut config = Config::load(config_file).context("Failed to load configuration")?;
    if let Some(addr) = cli.http {
        config.listen_addr = addr;
    }
    config.validate().map_err(anyhow::Error::msg)?;
    info!("Configuration loaded and validated");

    let listen_addr = config.listen_addr.clone();
    let app = ApplicationBuilder::new(config)
        .with_infrastructure()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?
        .build_router()
        .map_err(|e| anyhow::anyhow!("Failed to build application: {}", e))?;

    info!("Listening on {}", listen_addr);
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
