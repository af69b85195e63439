use sha2::{Digest, Sha256};

use crate::domain::errors::DomainError;

/// Number of shard buckets blobs are spread across.
pub const SHARD_COUNT: usize = 1024;

/// Hex characters of the key digest used to pick a bucket. Four hex digits
/// give 16 bits, an exact multiple of `SHARD_COUNT`.
const DIGEST_PREFIX_LEN: usize = 4;

/// Deterministic mapping from a key (a blob reference) to a shard bucket.
///
/// Bucket `i` is named by the three-digit lowercase hex of `i`
/// (`"000"`..`"3ff"`). The names decide physical placement, so they must
/// never change for a deployment, and write-time and read-time lookups must
/// go through the same `Sharder`.
#[derive(Debug, Clone)]
pub struct Sharder {
    buckets: Vec<String>,
}

impl Sharder {
    pub fn new() -> Self {
        Self {
            buckets: (0..SHARD_COUNT).map(|i| format!("{:03x}", i)).collect(),
        }
    }

    /// Bucket name for `key`.
    pub fn shard(&self, key: &str) -> Result<&str, DomainError> {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.bucket_for_digest(&digest)
    }

    /// Bucket name for an already computed hex digest.
    pub fn bucket_for_digest(&self, hex_digest: &str) -> Result<&str, DomainError> {
        let index = Self::bucket_index(hex_digest)?;
        Ok(&self.buckets[index])
    }

    /// Reduce the digest's hex prefix modulo `SHARD_COUNT`. A prefix that is
    /// short or not plain hex is rejected rather than mapped to bucket 0.
    pub fn bucket_index(hex_digest: &str) -> Result<usize, DomainError> {
        let prefix = hex_digest
            .get(..DIGEST_PREFIX_LEN)
            .filter(|p| p.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| DomainError::InvalidShardDigest(hex_digest.to_string()))?;

        let value = u32::from_str_radix(prefix, 16)
            .map_err(|_| DomainError::InvalidShardDigest(hex_digest.to_string()))?;

        Ok(value as usize % SHARD_COUNT)
    }

    pub fn buckets(&self) -> &[String] {
        &self.buckets
    }

    pub fn bucket(&self, index: usize) -> Option<&str> {
        self.buckets.get(index).map(String::as_str)
    }
}

impl Default for Sharder {
    fn default() -> Self {
        Self::new()
    }
}
