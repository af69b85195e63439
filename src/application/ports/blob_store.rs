use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};

use super::object_backend::StorageError;
use crate::domain::entities::{Blob, BlobReader};
use crate::domain::value_objects::{Ref, SizedRef};

/// Physical location of a blob: the shard container and the object name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub container: String,
    pub object: String,
}

impl BlobLocation {
    /// Backend-relative path `<container>/<object>`, as reported to clients.
    pub fn path(&self) -> String {
        format!("{}/{}", self.container, self.object)
    }
}

/// Stored blob metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobStat {
    pub location: BlobLocation,
    pub md5: String,
    pub size: u64,
}

/// Port for sharded blob storage.
///
/// Every operation places the blob by sharding its reference string, so a
/// blob written under a reference is always read back from the same
/// container.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Where a blob with this reference lives.
    fn locate(&self, reference: &Ref) -> Result<BlobLocation, StorageError>;

    /// Open the blob, returning the stream and its declared size.
    /// The caller owns the stream.
    async fn fetch(&self, reference: &Ref) -> Result<(BlobReader, u32), StorageError>;

    /// Metadata of a stored blob, `None` if absent.
    async fn stat(&self, reference: &Ref) -> Result<Option<BlobStat>, StorageError>;

    /// Store a blob under `reference`.
    async fn put(&self, reference: &Ref, reader: BlobReader) -> Result<BlobStat, StorageError>;

    /// Lazily-resolving blob; nothing is read until it is opened.
    fn blob(&self, sized_ref: &SizedRef) -> Blob;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_path() {
        let location = BlobLocation {
            container: "blob-3ff".to_string(),
            object: "a.txt".to_string(),
        };
        assert_eq!(location.path(), "blob-3ff/a.txt");
    }
}
