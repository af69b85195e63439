use futures_util::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::application::dto::{StatItem, StatResponse};
use crate::application::ports::{BlobStore, StorageError};
use crate::domain::errors::DomainError;
use crate::domain::validation::validate_object_name;
use crate::domain::value_objects::Ref;

#[derive(Debug, Error)]
pub enum StatError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Use case: report which of the named blobs are stored, with their digest.
pub struct StatBlobsUseCase {
    store: Arc<dyn BlobStore>,
}

impl StatBlobsUseCase {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Blobs that are not stored are omitted; the rest keep request order.
    pub async fn execute(&self, names: &[String]) -> Result<StatResponse, StatError> {
        for name in names {
            validate_object_name(name)?;
        }

        let stats = try_join_all(names.iter().map(|name| {
            let reference = Ref::from_id(name.as_str());
            let store = Arc::clone(&self.store);
            async move { store.stat(&reference).await }
        }))
        .await?;

        let stat: Vec<StatItem> = stats
            .into_iter()
            .flatten()
            .map(|s| StatItem {
                path: s.location.path(),
                md5: s.md5,
            })
            .collect();

        debug!(requested = names.len(), found = stat.len(), "Stat blobs");
        Ok(StatResponse { stat })
    }
}
