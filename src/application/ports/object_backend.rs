use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::entities::BlobReader;
use crate::domain::errors::DomainError;

/// Response/request metadata of the backend, keyed by header name.
pub type ObjectHeaders = HashMap<String, String>;

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const ETAG: &str = "Etag";
pub const CONTAINER_READ: &str = "X-Container-Read";
pub const CONTAINER_OBJECT_COUNT: &str = "X-Container-Object-Count";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Container not empty: {0}")]
    ContainerNotEmpty(String),

    #[error("Bad Header '{header}': '{value}': {reason}")]
    HeaderParse {
        header: String,
        value: String,
        reason: String,
    },

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Look up a header by case-insensitive name.
pub fn header<'a>(headers: &'a ObjectHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Port for the container/object storage backend.
///
/// Objects live in named containers; every response carries metadata
/// headers (`Content-Length`, `Etag` for objects, `X-Container-Read` for
/// containers).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Open a stream over an object, returning it with the object's headers.
    async fn object_open(
        &self,
        container: &str,
        object: &str,
    ) -> Result<(BlobReader, ObjectHeaders), StorageError>;

    /// Headers of an object, or `None` if it does not exist.
    async fn object_headers(
        &self,
        container: &str,
        object: &str,
    ) -> Result<Option<ObjectHeaders>, StorageError>;

    /// Store an object, replacing any previous content, and return its headers.
    async fn object_put(
        &self,
        container: &str,
        object: &str,
        reader: BlobReader,
    ) -> Result<ObjectHeaders, StorageError>;

    /// Create a container (idempotent), setting its metadata headers.
    async fn container_create(
        &self,
        container: &str,
        headers: ObjectHeaders,
    ) -> Result<(), StorageError>;

    /// Metadata headers of a container.
    async fn container_headers(&self, container: &str) -> Result<ObjectHeaders, StorageError>;

    /// Delete an empty container.
    async fn container_delete(&self, container: &str) -> Result<(), StorageError>;
}
