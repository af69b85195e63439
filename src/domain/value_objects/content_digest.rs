use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Length of an MD5 digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 32;

/// MD5 content digest (16 bytes = 32 hex chars), compared against the
/// `md5` reported by the server's stat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Create from validated hex string
    pub fn from_hex(hex: impl Into<String>) -> Result<Self, DomainError> {
        let hex = hex.into();
        if hex.len() != DIGEST_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidContentDigest(hex));
        }

        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Digest of an in-memory payload.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", md5::compute(data)))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison with a digest reported by a peer.
    pub fn matches(&self, reported: &str) -> bool {
        self.0.eq_ignore_ascii_case(reported.trim())
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContentDigest {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Incremental digest computation for streamed content.
pub struct DigestBuilder {
    context: md5::Context,
    len: u64,
}

impl DigestBuilder {
    pub fn new() -> Self {
        Self {
            context: md5::Context::new(),
            len: 0,
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.context.consume(chunk);
        self.len += chunk.len() as u64;
    }

    /// Bytes consumed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(self) -> ContentDigest {
        ContentDigest(format!("{:x}", self.context.compute()))
    }
}

impl Default for DigestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
