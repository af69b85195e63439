use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blob_gateway::{
    application::lifecycle::{LifecyclePipeline, PipelineConfig},
    application::ports::ObjectBackend,
    infrastructure::storage::{LocalContainerBackend, ShardedBlobStore, DEFAULT_READ_ACL},
};

/// Drive every shard container through create, read-ACL check and delete.
#[derive(Parser, Debug)]
#[command(name = "shard-lifecycle", version)]
struct Cli {
    /// Backend storage root
    #[arg(long, env = "STORAGE_ROOT")]
    storage_root: PathBuf,

    /// Container name prefix; keep it apart from live shard containers
    #[arg(long, default_value = "ctest-")]
    prefix: String,

    /// Expected read ACL
    #[arg(long, default_value = DEFAULT_READ_ACL)]
    read_acl: String,

    /// Workers per stage
    #[arg(long, default_value_t = 64)]
    workers: usize,

    /// Only run the first N containers
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let local = LocalContainerBackend::new(cli.storage_root.clone());
    local
        .init()
        .await
        .with_context(|| format!("Failed to initialize {:?}", cli.storage_root))?;
    let backend: Arc<dyn ObjectBackend> = Arc::new(local);

    let store = ShardedBlobStore::with_read_acl(Arc::clone(&backend), cli.prefix, cli.read_acl.clone());
    let mut containers = store.container_names();
    if let Some(limit) = cli.limit {
        containers.truncate(limit);
    }

    let pipeline = LifecyclePipeline::standard(
        backend,
        &cli.read_acl,
        PipelineConfig::new(cli.workers, cli.workers),
    );
    let report = pipeline.run(containers).await?;

    info!(
        completed = report.completed,
        elapsed = ?report.elapsed,
        "All shard containers passed the lifecycle"
    );
    println!("{} containers completed in {:?}", report.completed, report.elapsed);
    Ok(())
}
