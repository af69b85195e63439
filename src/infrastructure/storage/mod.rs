mod content_hasher;
mod local_container_backend;
mod sharded_blob_store;

pub use content_hasher::ContentHasher;
pub use local_container_backend::LocalContainerBackend;
pub use sharded_blob_store::{ShardedBlobStore, DEFAULT_CONTAINER_PREFIX, DEFAULT_READ_ACL};
