use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::Path;
use uuid::Uuid;

use super::blob_ref::{Ref, SizedRef};
use super::buffer_pool::BufferPool;

/// Extension used when a filename has none.
pub const DEFAULT_EXTENSION: &str = "bin";

/// Generates fresh blob references.
///
/// The random source and the scratch-buffer pool are injected so tests can
/// use a seeded generator and observe pool reuse.
pub struct RefGenerator {
    rng: Mutex<Box<dyn RngCore + Send>>,
    buffers: BufferPool,
}

impl RefGenerator {
    pub fn new(rng: impl RngCore + Send + 'static, buffers: BufferPool) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
            buffers,
        }
    }

    /// Generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng(), BufferPool::default())
    }

    /// Deterministic generator for tests and benchmarks.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), BufferPool::default())
    }

    /// New reference `<uuid-v4>.<ext>`, where `ext` is the extension of
    /// `name` with its case preserved, or `bin` when there is none.
    pub fn new_ref(&self, name: &str) -> Ref {
        let mut random = [0u8; 16];
        self.rng.lock().fill_bytes(&mut random);
        let token = uuid::Builder::from_random_bytes(random).into_uuid();

        let mut encoded = Uuid::encode_buffer();
        let token = token.hyphenated().encode_lower(&mut encoded);
        let ext = extension(name);

        let mut buf = self.buffers.acquire(token.len() + 1 + ext.len());
        buf.extend_from_slice(token.as_bytes());
        buf.push(b'.');
        buf.extend_from_slice(ext.as_bytes());
        let id = String::from_utf8_lossy(&buf).into_owned();
        self.buffers.release(buf);

        Ref::from_id(id)
    }

    /// New reference with size zero; set the size with `SizedRef::with_size`.
    pub fn new_sized_ref(&self, name: &str) -> SizedRef {
        SizedRef::new(self.new_ref(name), 0)
    }

    pub fn buffers(&self) -> &BufferPool {
        &self.buffers
    }
}

impl Default for RefGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

fn extension(name: &str) -> &str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION)
}
