use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::application::ports::StorageError;
use crate::domain::value_objects::{ContentDigest, DigestBuilder};

/// Buffer size for I/O operations.
const BUFFER_SIZE: usize = 256 * 1024;

/// Utility for computing MD5 content digests while storing objects.
///
/// The digest is the object's `Etag` and the `md5` reported by stat, so it is
/// computed in the same pass that writes the data, with no second read.
pub struct ContentHasher;

impl ContentHasher {
    /// Write stream to file and compute its digest simultaneously.
    ///
    /// Returns the digest and the number of bytes written.
    pub async fn write_and_digest(
        dest_path: &Path,
        reader: impl AsyncRead + Unpin,
    ) -> Result<(ContentDigest, u64), StorageError> {
        Self::write_and_digest_with_durability(dest_path, reader, true).await
    }

    /// Like [`write_and_digest`](Self::write_and_digest), with `fsync()`
    /// skipped when `durable` is false.
    pub async fn write_and_digest_with_durability(
        dest_path: &Path,
        mut reader: impl AsyncRead + Unpin,
        durable: bool,
    ) -> Result<(ContentDigest, u64), StorageError> {
        let mut file =
            tokio::io::BufWriter::with_capacity(BUFFER_SIZE * 2, File::create(dest_path).await?);

        let mut digest = DigestBuilder::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            digest.update(&buffer[..n]);
            file.write_all(&buffer[..n]).await?;
        }

        file.flush().await?;
        if durable {
            file.get_mut().sync_all().await?;
        }

        let total_bytes = digest.len();
        Ok((digest.finish(), total_bytes))
    }
}
