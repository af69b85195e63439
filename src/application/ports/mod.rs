mod blob_service;
mod blob_store;
mod object_backend;

pub use blob_service::{BlobService, ClientError, UploadFile};
pub use blob_store::{BlobLocation, BlobStat, BlobStore};
pub use object_backend::{
    header, ObjectBackend, ObjectHeaders, StorageError, CONTAINER_OBJECT_COUNT, CONTAINER_READ,
    CONTENT_LENGTH, ETAG,
};

pub use crate::domain::entities::BlobReader;

#[cfg(test)]
pub use blob_service::MockBlobService;
#[cfg(test)]
pub use blob_store::MockBlobStore;
#[cfg(test)]
pub use object_backend::MockObjectBackend;
