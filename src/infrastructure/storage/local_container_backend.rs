use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::BufReader;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::{
    BlobReader, ObjectBackend, ObjectHeaders, StorageError, CONTAINER_OBJECT_COUNT,
    CONTENT_LENGTH, ETAG,
};
use crate::domain::validation::{validate_container_name, validate_object_name};
use crate::infrastructure::storage::ContentHasher;

const TEMP_DIR: &str = ".tmp";
const CONTAINER_FILE: &str = ".container.json";
const META_DIR: &str = ".meta";
const DATA_DIR: &str = ".data";

/// Times a reader re-reads an object record whose data was replaced between
/// reading the record and opening the data.
const OPEN_ATTEMPTS: usize = 5;

/// Committed state of one object: the data version it points at and the
/// headers computed while that version was written.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectRecord {
    data: String,
    headers: ObjectHeaders,
}

/// Filesystem implementation of the container/object backend.
///
/// ```text
/// <root>/.tmp/<uuid>                     in-flight writes
/// <root>/<container>/.container.json     container headers
/// <root>/<container>/.meta/<object>      object record (data version + headers)
/// <root>/<container>/.data/<uuid>        immutable object data
/// ```
///
/// A put writes a fresh data version, then publishes it by renaming the
/// object record into `.meta/`. That rename is the single commit point, so
/// every reader sees data and headers from the same put. Replaced versions
/// are unlinked after the commit; readers that already opened them keep
/// their handle, and readers that lose the race re-read the record.
pub struct LocalContainerBackend {
    root: PathBuf,
    durable_writes: bool,
    commit_lock: Mutex<()>,
}

impl LocalContainerBackend {
    pub fn new(root: PathBuf) -> Self {
        Self::with_durability(root, true)
    }

    pub fn with_durability(root: PathBuf, durable_writes: bool) -> Self {
        Self {
            root,
            durable_writes,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Initialize storage directories
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.root.join(TEMP_DIR)).await?;
        Ok(())
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, StorageError> {
        validate_container_name(container)?;
        Ok(self.root.join(container))
    }

    async fn existing_container_dir(&self, container: &str) -> Result<PathBuf, StorageError> {
        let dir = self.container_dir(container)?;
        match fs::metadata(dir.join(CONTAINER_FILE)).await {
            Ok(_) => Ok(dir),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::ContainerNotFound(container.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Container directory and record path of an object.
    async fn object_location(
        &self,
        container: &str,
        object: &str,
    ) -> Result<(PathBuf, PathBuf), StorageError> {
        validate_object_name(object)?;
        let dir = self.existing_container_dir(container).await?;
        let record_path = dir.join(META_DIR).join(object);
        Ok((dir, record_path))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        match fs::read(path).await {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| StorageError::Internal(format!("Corrupt file {:?}: {}", path, e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_vec(value).map_err(|e| StorageError::Internal(e.to_string()))?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, data).await?;
        if self.durable_writes {
            File::open(&temp_path).await?.sync_all().await?;
        }
        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }
        Ok(())
    }

    async fn read_record(path: &Path) -> Result<Option<ObjectRecord>, StorageError> {
        let record: Option<ObjectRecord> = Self::read_json(path).await?;
        if let Some(record) = &record {
            // Data versions are always UUIDs; anything else would escape `.data/`.
            if Uuid::parse_str(&record.data).is_err() {
                return Err(StorageError::Internal(format!(
                    "Corrupt record {:?}: bad data version '{}'",
                    path, record.data
                )));
            }
        }
        Ok(record)
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(TEMP_DIR).join(Uuid::new_v4().to_string())
    }

    /// Every entry under `.meta/` is one committed object, whatever its name.
    async fn count_objects(dir: &Path) -> Result<usize, StorageError> {
        let mut entries = match fs::read_dir(dir.join(META_DIR)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::Io(e)),
        };
        let mut count = 0;
        while entries.next_entry().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    async fn sync_dir(&self, dir: &Path) {
        if !self.durable_writes {
            return;
        }
        match File::open(dir).await {
            Ok(handle) => {
                if let Err(e) = handle.sync_all().await {
                    warn!("Failed to sync directory {:?} after rename: {}", dir, e);
                }
            }
            Err(e) => warn!("Failed to open directory {:?} for sync: {}", dir, e),
        }
    }
}

fn object_headers(len: u64, etag: &str) -> ObjectHeaders {
    let mut headers = ObjectHeaders::new();
    headers.insert(CONTENT_LENGTH.to_string(), len.to_string());
    headers.insert(ETAG.to_string(), etag.to_string());
    headers
}

fn object_key(container: &str, object: &str) -> String {
    format!("{}/{}", container, object)
}

#[async_trait]
impl ObjectBackend for LocalContainerBackend {
    async fn object_open(
        &self,
        container: &str,
        object: &str,
    ) -> Result<(BlobReader, ObjectHeaders), StorageError> {
        let (dir, record_path) = self.object_location(container, object).await?;

        for _ in 0..OPEN_ATTEMPTS {
            let record = Self::read_record(&record_path)
                .await?
                .ok_or_else(|| StorageError::NotFound(object_key(container, object)))?;

            match File::open(dir.join(DATA_DIR).join(&record.data)).await {
                Ok(file) => return Ok((Box::pin(BufReader::new(file)), record.headers)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(container, object, "Object replaced while opening, re-reading record");
                }
                Err(e) => return Err(StorageError::Io(e)),
            }
        }

        Err(StorageError::Internal(format!(
            "Data of {} missing after {} attempts",
            object_key(container, object),
            OPEN_ATTEMPTS
        )))
    }

    async fn object_headers(
        &self,
        container: &str,
        object: &str,
    ) -> Result<Option<ObjectHeaders>, StorageError> {
        let (_, record_path) = self.object_location(container, object).await?;
        Ok(Self::read_record(&record_path).await?.map(|r| r.headers))
    }

    async fn object_put(
        &self,
        container: &str,
        object: &str,
        reader: BlobReader,
    ) -> Result<ObjectHeaders, StorageError> {
        let (dir, record_path) = self.object_location(container, object).await?;

        let temp_path = self.temp_path();
        debug!("Writing object to temp file: {:?}", temp_path);
        let (digest, size) = match ContentHasher::write_and_digest_with_durability(
            &temp_path,
            reader,
            self.durable_writes,
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to write object to temp file {:?}: {}", temp_path, e);
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        let version = Uuid::new_v4().to_string();
        let data_path = dir.join(DATA_DIR).join(&version);
        if let Err(e) = fs::rename(&temp_path, &data_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        let headers = object_headers(size, digest.as_hex());
        let record = ObjectRecord {
            data: version,
            headers: headers.clone(),
        };

        let replaced = {
            let _commit = self.commit_lock.lock().await;
            let replaced = match Self::read_record(&record_path).await {
                Ok(previous) => previous,
                Err(e) => {
                    warn!("Overwriting unreadable record {:?}: {}", record_path, e);
                    None
                }
            };
            if let Err(e) = self.write_json(&record_path, &record).await {
                let _ = fs::remove_file(&data_path).await;
                return Err(e);
            }
            replaced
        };
        self.sync_dir(&dir.join(DATA_DIR)).await;
        self.sync_dir(&dir.join(META_DIR)).await;

        if let Some(previous) = replaced {
            if let Err(e) = fs::remove_file(dir.join(DATA_DIR).join(&previous.data)).await {
                warn!(container, object, "Failed to remove replaced data {}: {}", previous.data, e);
            }
        }

        debug!(container, object, size, etag = %digest, "Stored object");
        Ok(headers)
    }

    async fn container_create(
        &self,
        container: &str,
        headers: ObjectHeaders,
    ) -> Result<(), StorageError> {
        let dir = self.container_dir(container)?;
        fs::create_dir_all(dir.join(META_DIR)).await?;
        fs::create_dir_all(dir.join(DATA_DIR)).await?;

        let header_path = dir.join(CONTAINER_FILE);
        let mut merged: ObjectHeaders = Self::read_json(&header_path).await?.unwrap_or_default();
        merged.extend(headers);
        self.write_json(&header_path, &merged).await
    }

    async fn container_headers(&self, container: &str) -> Result<ObjectHeaders, StorageError> {
        let dir = self.existing_container_dir(container).await?;
        let mut headers: ObjectHeaders = Self::read_json(&dir.join(CONTAINER_FILE))
            .await?
            .unwrap_or_default();
        let count = Self::count_objects(&dir).await?;
        headers.insert(CONTAINER_OBJECT_COUNT.to_string(), count.to_string());
        Ok(headers)
    }

    async fn container_delete(&self, container: &str) -> Result<(), StorageError> {
        let dir = self.existing_container_dir(container).await?;
        if Self::count_objects(&dir).await? > 0 {
            return Err(StorageError::ContainerNotEmpty(container.to_string()));
        }
        fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{header, CONTAINER_READ};
    use crate::domain::errors::DomainError;
    use crate::domain::value_objects::ContentDigest;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    async fn backend() -> (TempDir, LocalContainerBackend) {
        let dir = TempDir::new().unwrap();
        let backend = LocalContainerBackend::with_durability(dir.path().to_path_buf(), false);
        backend.init().await.unwrap();
        (dir, backend)
    }

    fn acl(value: &str) -> ObjectHeaders {
        let mut headers = ObjectHeaders::new();
        headers.insert(CONTAINER_READ.to_string(), value.to_string());
        headers
    }

    #[tokio::test]
    async fn test_put_and_open_object() {
        let (_dir, backend) = backend().await;
        backend.container_create("blob-000", acl(".r:*")).await.unwrap();

        let headers = backend
            .object_put("blob-000", "a.txt", Box::pin(Cursor::new(b"hello".to_vec())))
            .await
            .unwrap();
        assert_eq!(header(&headers, CONTENT_LENGTH), Some("5"));
        assert_eq!(header(&headers, ETAG), Some("5d41402abc4b2a76b9719d911017c592"));

        let (mut reader, opened) = backend.object_open("blob-000", "a.txt").await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");
        assert_eq!(opened, headers);
    }

    #[tokio::test]
    async fn test_put_replaces_content() {
        let (_dir, backend) = backend().await;
        backend.container_create("blob-000", acl(".r:*")).await.unwrap();

        for data in [&b"first"[..], &b"second"[..]] {
            backend
                .object_put("blob-000", "a.txt", Box::pin(Cursor::new(data.to_vec())))
                .await
                .unwrap();
        }

        let headers = backend.object_headers("blob-000", "a.txt").await.unwrap().unwrap();
        assert_eq!(header(&headers, CONTENT_LENGTH), Some("6"));
    }

    #[tokio::test]
    async fn test_missing_object_and_container() {
        let (_dir, backend) = backend().await;
        assert!(matches!(
            backend.object_open("blob-000", "a.txt").await,
            Err(StorageError::ContainerNotFound(_))
        ));

        backend.container_create("blob-000", acl(".r:*")).await.unwrap();
        assert!(matches!(
            backend.object_open("blob-000", "a.txt").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(backend.object_headers("blob-000", "a.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_names() {
        let (_dir, backend) = backend().await;
        backend.container_create("blob-000", acl(".r:*")).await.unwrap();

        for name in ["..", "a/b", ""] {
            let result = backend
                .object_put("blob-000", name, Box::pin(Cursor::new(Vec::new())))
                .await;
            assert!(
                matches!(result, Err(StorageError::Domain(DomainError::InvalidName(_)))),
                "{:?} should be rejected",
                name
            );
        }
        assert!(backend.container_create(".tmp", acl("")).await.is_err());
    }

    #[tokio::test]
    async fn test_dot_names_are_ordinary_objects() {
        let (_dir, backend) = backend().await;
        backend.container_create("c", acl(".r:*")).await.unwrap();

        for name in [".bashrc", ".meta", ".container.json", ".data"] {
            backend
                .object_put("c", name, Box::pin(Cursor::new(name.as_bytes().to_vec())))
                .await
                .unwrap();
        }

        let headers = backend.container_headers("c").await.unwrap();
        assert_eq!(header(&headers, CONTAINER_OBJECT_COUNT), Some("4"));
        assert_eq!(header(&headers, CONTAINER_READ), Some(".r:*"));
        assert!(matches!(
            backend.container_delete("c").await,
            Err(StorageError::ContainerNotEmpty(_))
        ));

        let (mut reader, _) = backend.object_open("c", ".bashrc").await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b".bashrc");
    }

    #[tokio::test]
    async fn test_container_create_is_idempotent() {
        let (_dir, backend) = backend().await;
        backend.container_create("c", acl(".r:*,.rlistings")).await.unwrap();
        backend.container_create("c", ObjectHeaders::new()).await.unwrap();

        let headers = backend.container_headers("c").await.unwrap();
        assert_eq!(header(&headers, CONTAINER_READ), Some(".r:*,.rlistings"));
        assert_eq!(header(&headers, CONTAINER_OBJECT_COUNT), Some("0"));
    }

    #[tokio::test]
    async fn test_delete_requires_empty_container() {
        let (dir, backend) = backend().await;
        backend.container_create("c", acl(".r:*")).await.unwrap();
        backend
            .object_put("c", "x.bin", Box::pin(Cursor::new(b"x".to_vec())))
            .await
            .unwrap();

        assert!(matches!(
            backend.container_delete("c").await,
            Err(StorageError::ContainerNotEmpty(_))
        ));

        backend.container_create("d", acl(".r:*")).await.unwrap();
        backend.container_delete("d").await.unwrap();
        assert!(!dir.path().join("d").exists());
        assert!(matches!(
            backend.container_headers("d").await,
            Err(StorageError::ContainerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replaced_data_is_removed() {
        let (dir, backend) = backend().await;
        backend.container_create("c", acl(".r:*")).await.unwrap();

        for data in ["one", "two", "three"] {
            backend
                .object_put("c", "a.txt", Box::pin(Cursor::new(data.as_bytes().to_vec())))
                .await
                .unwrap();
        }

        let versions = std::fs::read_dir(dir.path().join("c").join(DATA_DIR))
            .unwrap()
            .count();
        assert_eq!(versions, 1);
        let leftovers = std::fs::read_dir(dir.path().join(TEMP_DIR)).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_record_pointing_outside_data_dir_is_rejected() {
        let (dir, backend) = backend().await;
        backend.container_create("c", acl(".r:*")).await.unwrap();
        std::fs::write(
            dir.path().join("c").join(META_DIR).join("evil"),
            r#"{"data":"../.container.json","headers":{}}"#,
        )
        .unwrap();

        assert!(matches!(
            backend.object_open("c", "evil").await,
            Err(StorageError::Internal(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_see_headers_of_the_data_they_read() {
        let (_dir, backend) = backend().await;
        let backend = Arc::new(backend);
        backend.container_create("c", acl(".r:*")).await.unwrap();
        backend
            .object_put("c", "a.bin", Box::pin(Cursor::new(vec![b'x'])))
            .await
            .unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let backend = Arc::clone(&backend);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                for i in 0..200 {
                    let data = if i % 2 == 0 { vec![b'y'; 4096] } else { vec![b'x'] };
                    backend
                        .object_put("c", "a.bin", Box::pin(Cursor::new(data)))
                        .await
                        .unwrap();
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let mut reads = 0;
        while !done.load(Ordering::SeqCst) || reads == 0 {
            let (mut reader, headers) = backend.object_open("c", "a.bin").await.unwrap();
            let mut out = Vec::new();
            reader.read_to_end(&mut out).await.unwrap();

            assert_eq!(header(&headers, CONTENT_LENGTH), Some(out.len().to_string().as_str()));
            assert_eq!(header(&headers, ETAG), Some(ContentDigest::of_bytes(&out).as_hex()));
            reads += 1;
        }
        writer.await.unwrap();
    }
}
