use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::application::dto::ReceivedItem;
use crate::application::ports::{BlobReader, BlobStore, StorageError};
use crate::domain::errors::DomainError;
use crate::domain::validation::validate_object_name;
use crate::domain::value_objects::{Ref, RefGenerator, SizedRef};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Use case: store an uploaded file as a blob.
pub struct UploadBlobsUseCase {
    store: Arc<dyn BlobStore>,
    generator: Arc<RefGenerator>,
}

impl UploadBlobsUseCase {
    pub fn new(store: Arc<dyn BlobStore>, generator: Arc<RefGenerator>) -> Self {
        Self { store, generator }
    }

    /// Reference a file is stored under: its own name, or a fresh
    /// `<uuid>.<ext>` reference.
    pub fn reference_for(&self, filename: &str, use_filename: bool) -> Result<Ref, UploadError> {
        if use_filename {
            validate_object_name(filename)?;
            Ok(Ref::from_id(filename))
        } else {
            Ok(self.generator.new_ref(filename))
        }
    }

    /// Execute upload workflow for one file.
    pub async fn execute(
        &self,
        filename: &str,
        use_filename: bool,
        reader: BlobReader,
    ) -> Result<(SizedRef, ReceivedItem), UploadError> {
        let reference = self.reference_for(filename, use_filename)?;
        let stat = self.store.put(&reference, reader).await?;

        let size = u32::try_from(stat.size).map_err(|_| DomainError::SizeExceedsMaximum {
            size: stat.size,
            max: u64::from(u32::MAX),
        })?;
        let sized_ref = SizedRef::new(reference, size);

        info!(blob = %sized_ref, path = %stat.location.path(), "Stored blob");
        Ok((
            sized_ref,
            ReceivedItem {
                path: stat.location.path(),
            },
        ))
    }
}
