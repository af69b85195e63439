use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::ports::{
    header, BlobLocation, BlobReader, BlobStat, BlobStore, ObjectBackend, ObjectHeaders,
    StorageError, CONTAINER_READ, CONTENT_LENGTH, ETAG,
};
use crate::domain::entities::{Blob, DeferredReader};
use crate::domain::value_objects::{Ref, Sharder, SizedRef};

/// Default prefix of shard container names.
pub const DEFAULT_CONTAINER_PREFIX: &str = "blob-";

/// Default read ACL set on shard containers: public read and listing.
pub const DEFAULT_READ_ACL: &str = ".r:*,.rlistings";

/// Blob store spreading blobs over one backend container per shard bucket.
///
/// The container of a blob is `<prefix><bucket>`, where the bucket comes
/// from sharding the blob's reference string.
#[derive(Clone)]
pub struct ShardedBlobStore {
    backend: Arc<dyn ObjectBackend>,
    sharder: Arc<Sharder>,
    prefix: String,
    read_acl: String,
}

impl ShardedBlobStore {
    pub fn new(backend: Arc<dyn ObjectBackend>, prefix: impl Into<String>) -> Self {
        Self::with_read_acl(backend, prefix, DEFAULT_READ_ACL)
    }

    pub fn with_read_acl(
        backend: Arc<dyn ObjectBackend>,
        prefix: impl Into<String>,
        read_acl: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            sharder: Arc::new(Sharder::new()),
            prefix: prefix.into(),
            read_acl: read_acl.into(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    pub fn read_acl(&self) -> &str {
        &self.read_acl
    }

    /// Names of every shard container, in bucket order.
    pub fn container_names(&self) -> Vec<String> {
        self.sharder
            .buckets()
            .iter()
            .map(|bucket| format!("{}{}", self.prefix, bucket))
            .collect()
    }

    /// Create every shard container with the configured read ACL.
    /// Safe to run on every start.
    pub async fn init(&self) -> Result<(), StorageError> {
        for container in self.container_names() {
            let mut headers = ObjectHeaders::new();
            headers.insert(CONTAINER_READ.to_string(), self.read_acl.clone());
            self.backend.container_create(&container, headers).await?;
        }
        info!(
            containers = self.sharder.buckets().len(),
            prefix = %self.prefix,
            "Shard containers ready"
        );
        Ok(())
    }

    fn stat_from_headers(
        location: BlobLocation,
        headers: &ObjectHeaders,
    ) -> Result<BlobStat, StorageError> {
        let size = parse_content_length(headers)?;
        let md5 = header(headers, ETAG)
            .map(|etag| etag.trim_matches('"').to_ascii_lowercase())
            .unwrap_or_default();
        Ok(BlobStat { location, md5, size })
    }
}

/// Parse the `Content-Length` header; a missing or non-numeric value is a
/// header error, not an open failure.
fn parse_content_length(headers: &ObjectHeaders) -> Result<u64, StorageError> {
    let value = header(headers, CONTENT_LENGTH).ok_or_else(|| StorageError::HeaderParse {
        header: CONTENT_LENGTH.to_string(),
        value: String::new(),
        reason: "missing".to_string(),
    })?;

    value.trim().parse::<u64>().map_err(|e| StorageError::HeaderParse {
        header: CONTENT_LENGTH.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl BlobStore for ShardedBlobStore {
    fn locate(&self, reference: &Ref) -> Result<BlobLocation, StorageError> {
        let bucket = self.sharder.shard(reference.as_str())?;
        Ok(BlobLocation {
            container: format!("{}{}", self.prefix, bucket),
            object: reference.as_str().to_string(),
        })
    }

    async fn fetch(&self, reference: &Ref) -> Result<(BlobReader, u32), StorageError> {
        let location = self.locate(reference)?;
        let (reader, headers) = self
            .backend
            .object_open(&location.container, &location.object)
            .await?;

        // On a bad header the opened stream is dropped here, closing it.
        let size = parse_content_length(&headers)?;
        let size = u32::try_from(size).map_err(|e| StorageError::HeaderParse {
            header: CONTENT_LENGTH.to_string(),
            value: size.to_string(),
            reason: e.to_string(),
        })?;

        debug!(blob = %reference, container = %location.container, size, "Fetched blob");
        Ok((reader, size))
    }

    async fn stat(&self, reference: &Ref) -> Result<Option<BlobStat>, StorageError> {
        let location = self.locate(reference)?;
        match self
            .backend
            .object_headers(&location.container, &location.object)
            .await?
        {
            Some(headers) => Ok(Some(Self::stat_from_headers(location, &headers)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, reference: &Ref, reader: BlobReader) -> Result<BlobStat, StorageError> {
        let location = self.locate(reference)?;
        let headers = self
            .backend
            .object_put(&location.container, &location.object, reader)
            .await?;
        Self::stat_from_headers(location, &headers)
    }

    fn blob(&self, sized_ref: &SizedRef) -> Blob {
        let store = self.clone();
        let reference = sized_ref.reference().clone();
        Blob::new(reference.clone(), sized_ref.size(), move || {
            let store = store.clone();
            let reference = reference.clone();
            Box::pin(DeferredReader::new(async move {
                let (reader, _) = store.fetch(&reference).await.map_err(into_io_error)?;
                Ok(reader)
            })) as BlobReader
        })
    }
}

fn into_io_error(err: StorageError) -> io::Error {
    match err {
        StorageError::Io(e) => e,
        StorageError::NotFound(name) => io::Error::new(io::ErrorKind::NotFound, name),
        other => io::Error::other(other),
    }
}
