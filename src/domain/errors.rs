use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("blob: expecting a JSON string to unmarshal, got {0:?}")]
    InvalidRefFormat(String),

    #[error("Invalid shard digest: {0:?}")]
    InvalidShardDigest(String),

    #[error("Invalid content digest: {0:?}")]
    InvalidContentDigest(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Duplicate filename in batch: {0}")]
    DuplicateFilename(String),

    #[error("Ambiguous remote path: {0}")]
    AmbiguousRemotePath(String),

    #[error("No local resource matches remote path: {0}")]
    UnmatchedRemotePath(String),

    #[error("Blob size exceeds maximum allowed: {size} > {max}")]
    SizeExceedsMaximum { size: u64, max: u64 },
}
