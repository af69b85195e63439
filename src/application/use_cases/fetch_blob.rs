use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::application::ports::{BlobStore, StorageError};
use crate::domain::entities::Blob;
use crate::domain::errors::DomainError;
use crate::domain::validation::{validate_container_name, validate_object_name};
use crate::domain::value_objects::{Ref, SizedRef};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A stored blob ready to stream, with the metadata served alongside it.
#[derive(Debug, Clone)]
pub struct FetchedBlob {
    pub blob: Blob,
    pub md5: String,
}

/// Use case: resolve a blob by name for download.
pub struct FetchBlobUseCase {
    store: Arc<dyn BlobStore>,
}

impl FetchBlobUseCase {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Nothing is read here; the returned blob opens its stream on demand.
    pub async fn execute(&self, name: &str) -> Result<FetchedBlob, FetchError> {
        self.resolve(None, name).await
    }

    /// Fetch by the `<container>/<name>` path that stat and upload report.
    /// The container must be the one the name shards to.
    pub async fn execute_in(&self, container: &str, name: &str) -> Result<FetchedBlob, FetchError> {
        validate_container_name(container)?;
        self.resolve(Some(container), name).await
    }

    async fn resolve(&self, container: Option<&str>, name: &str) -> Result<FetchedBlob, FetchError> {
        validate_object_name(name)?;
        let reference = Ref::from_id(name);

        let stat = self
            .store
            .stat(&reference)
            .await?
            .ok_or_else(|| FetchError::NotFound(name.to_string()))?;

        if let Some(container) = container {
            if stat.location.container != container {
                debug!(container, expected = %stat.location.container, name, "Wrong container");
                return Err(FetchError::NotFound(format!("{}/{}", container, name)));
            }
        }

        let size = u32::try_from(stat.size).map_err(|_| DomainError::SizeExceedsMaximum {
            size: stat.size,
            max: u64::from(u32::MAX),
        })?;

        debug!(blob = %reference, path = %stat.location.path(), "Resolved blob");
        Ok(FetchedBlob {
            blob: self.store.blob(&SizedRef::new(reference, size)),
            md5: stat.md5,
        })
    }
}
