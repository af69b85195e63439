use axum::Router;
use std::sync::Arc;
use tracing::info;

use crate::api::router::{create_router, AppState};
use crate::application::{
    dto::{ConfigData, ConfigResponse},
    ports::{BlobStore, ObjectBackend},
    use_cases::{FetchBlobUseCase, StatBlobsUseCase, UploadBlobsUseCase},
};
use crate::config::Config;
use crate::domain::value_objects::RefGenerator;
use crate::infrastructure::storage::{LocalContainerBackend, ShardedBlobStore};

type BuildResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Application builder for clean dependency injection and setup
pub struct ApplicationBuilder {
    config: Config,
    backend: Option<Arc<dyn ObjectBackend>>,
    store: Option<Arc<ShardedBlobStore>>,
    generator: Option<Arc<RefGenerator>>,
}

impl ApplicationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            backend: None,
            store: None,
            generator: None,
        }
    }

    /// Use this backend instead of a `LocalContainerBackend` under
    /// `storage_root`.
    pub fn with_backend(mut self, backend: Arc<dyn ObjectBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_ref_generator(mut self, generator: RefGenerator) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Initialize infrastructure layer: backend and shard containers.
    pub async fn with_infrastructure(mut self) -> BuildResult<Self> {
        let backend = match self.backend.take() {
            Some(backend) => backend,
            None => {
                info!("Using local container backend at {:?}", self.config.storage_root);
                let local = LocalContainerBackend::new(self.config.storage_root.clone());
                local.init().await?;
                Arc::new(local)
            }
        };

        let store = Arc::new(ShardedBlobStore::with_read_acl(
            Arc::clone(&backend),
            self.config.container_prefix.clone(),
            self.config.container_read_acl.clone(),
        ));
        store.init().await?;

        self.backend = Some(backend);
        self.store = Some(store);
        info!("Infrastructure layer initialized");
        Ok(self)
    }

    /// Build the application state.
    pub fn build(self) -> BuildResult<AppState> {
        let store = self
            .store
            .ok_or("Infrastructure not initialized; call with_infrastructure first")?;
        let generator = self
            .generator
            .unwrap_or_else(|| Arc::new(RefGenerator::from_entropy()));
        let blob_store: Arc<dyn BlobStore> = store.clone();

        let state = AppState {
            config: Arc::new(ConfigResponse {
                data: ConfigData {
                    cdn_url: self.config.cdn_url.clone(),
                },
            }),
            store,
            stat_use_case: Arc::new(StatBlobsUseCase::new(Arc::clone(&blob_store))),
            upload_use_case: Arc::new(UploadBlobsUseCase::new(Arc::clone(&blob_store), generator)),
            fetch_use_case: Arc::new(FetchBlobUseCase::new(blob_store)),
        };

        info!("Application layer initialized");
        Ok(state)
    }

    /// Build the state and the router serving it.
    pub fn build_router(self) -> BuildResult<Router> {
        let base_path = self.config.base_path.clone();
        let max_upload_bytes = self.config.max_upload_bytes;
        let state = self.build()?;
        Ok(create_router(state, &base_path, max_upload_bytes))
    }
}
