mod blob_ref;
mod buffer_pool;
mod content_digest;
mod ref_generator;
mod shard;

pub use blob_ref::{Ref, SizedRef};
pub use buffer_pool::{BufferPool, DEFAULT_POOL_CAPACITY};
pub use content_digest::{ContentDigest, DigestBuilder, DIGEST_HEX_LEN};
pub use ref_generator::{RefGenerator, DEFAULT_EXTENSION};
pub use shard::{Sharder, SHARD_COUNT};
