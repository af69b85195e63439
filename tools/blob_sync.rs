use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use blob_gateway::{
    application::encoder::{JsonEncoder, ResourceEncoder},
    application::use_cases::SyncFilesUseCase,
    config::DEFAULT_SERVER_ADDR,
    infrastructure::http::HttpBlobService,
    ClientConfig,
};

/// Upload files to the blob server, skipping content it already holds,
/// and print a JSON object mapping each path to its URL.
#[derive(Parser, Debug)]
#[command(name = "blob-sync", version)]
struct Cli {
    /// Blob server address including the API base path
    #[arg(long, env = "BLOB_SERVER_ADDR", default_value = DEFAULT_SERVER_ADDR)]
    server: String,

    /// Request timeout in seconds
    #[arg(long, env = "BLOB_CLIENT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Files to sync
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    // stdout carries only the mapping
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("blob-sync: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::new(cli.server, Duration::from_secs(cli.timeout_secs));
    config.validate().map_err(anyhow::Error::msg)?;

    let service = HttpBlobService::new(config.server_addr.clone(), config.timeout)
        .context("Failed to create HTTP client")?;
    let sync = SyncFilesUseCase::connect(Arc::new(service))
        .await
        .with_context(|| format!("Failed to reach blob server at {}", config.server_addr))?;

    let resources = sync.execute(&cli.files).await.context("Sync failed")?;
    info!(files = resources.len(), "Sync complete");

    let mut encoder = JsonEncoder::new(io::stdout().lock());
    encoder.encode(&resources).context("Failed to write result")?;
    Ok(())
}
