use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use blob_gateway::{
    application::{
        dto::{ConfigData, ConfigResponse, ReceivedItem, StatResponse, UploadResponse},
        encoder::{JsonEncoder, ResourceEncoder},
        lifecycle::{LifecyclePipeline, PipelineConfig},
        ports::{BlobService, ClientError, ObjectBackend, UploadFile},
        use_cases::{SyncError, SyncFilesUseCase},
    },
    domain::value_objects::{ContentDigest, SHARD_COUNT},
    infrastructure::{
        http::HttpBlobService,
        storage::{LocalContainerBackend, ShardedBlobStore, DEFAULT_READ_ACL},
    },
};

use test_fixtures::{write_files, TestServer, TEST_CDN_URL};

fn http_service(server: &TestServer) -> Arc<HttpBlobService> {
    Arc::new(HttpBlobService::new(server.base_url(), Duration::from_secs(10)).unwrap())
}

/// Delegates to another service and counts the files it uploads.
struct CountingService {
    inner: Arc<dyn BlobService>,
    uploaded: AtomicUsize,
}

impl CountingService {
    fn new(inner: Arc<dyn BlobService>) -> Self {
        Self {
            inner,
            uploaded: AtomicUsize::new(0),
        }
    }

    fn uploaded(&self) -> usize {
        self.uploaded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobService for CountingService {
    async fn config(&self) -> Result<ConfigResponse, ClientError> {
        self.inner.config().await
    }

    async fn stat(&self, filenames: &[String]) -> Result<StatResponse, ClientError> {
        self.inner.stat(filenames).await
    }

    async fn upload(&self, files: &[UploadFile]) -> Result<UploadResponse, ClientError> {
        self.uploaded.fetch_add(files.len(), Ordering::SeqCst);
        self.inner.upload(files).await
    }
}

/// Acknowledges only the first uploaded file.
struct ShortAckService;

#[async_trait]
impl BlobService for ShortAckService {
    async fn config(&self) -> Result<ConfigResponse, ClientError> {
        Ok(ConfigResponse {
            data: ConfigData {
                cdn_url: TEST_CDN_URL.to_string(),
            },
        })
    }

    async fn stat(&self, _filenames: &[String]) -> Result<StatResponse, ClientError> {
        Ok(StatResponse::default())
    }

    async fn upload(&self, files: &[UploadFile]) -> Result<UploadResponse, ClientError> {
        Ok(UploadResponse {
            received: files
                .iter()
                .take(1)
                .map(|f| ReceivedItem {
                    path: format!("blob-000/{}", f.filename),
                })
                .collect(),
        })
    }
}

#[tokio::test]
async fn test_sync_uploads_new_files() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("a.txt", "alpha"), ("b.txt", "beta")]);

    let sync = SyncFilesUseCase::connect(http_service(&server)).await.unwrap();
    assert_eq!(sync.cdn_url(), server.fetch_url());

    let resources = sync.execute(&paths).await.unwrap();
    assert_eq!(resources.len(), 2);
    for resource in resources.iter() {
        let url = resource.url().expect("every file gets a URL");
        assert!(
            url.starts_with(&format!("{}blob-", server.fetch_url())),
            "unexpected url {url}"
        );
        assert!(url.ends_with(&format!("/{}", resource.filename())));
        assert!(!resource.needs_upload());
    }

    // Every returned URL is served as-is.
    for (resource, data) in resources.iter().zip(["alpha", "beta"]) {
        let fetched = reqwest::get(resource.url().unwrap()).await.unwrap();
        assert_eq!(fetched.status(), reqwest::StatusCode::OK);
        assert_eq!(fetched.bytes().await.unwrap().as_ref(), data.as_bytes());
    }
}

#[tokio::test]
async fn test_second_sync_uploads_nothing() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("a.txt", "alpha"), ("b.txt", "beta"), ("c.txt", "gamma")]);

    let counting = Arc::new(CountingService::new(http_service(&server)));
    let sync = SyncFilesUseCase::connect(counting.clone()).await.unwrap();

    let first = sync.execute(&paths).await.unwrap();
    assert_eq!(counting.uploaded(), 3);

    let second = sync.execute(&paths).await.unwrap();
    assert_eq!(counting.uploaded(), 3);

    let first_urls: Vec<_> = first.iter().map(|r| r.url().map(str::to_string)).collect();
    let second_urls: Vec<_> = second.iter().map(|r| r.url().map(str::to_string)).collect();
    assert_eq!(first_urls, second_urls);
}

#[tokio::test]
async fn test_changed_content_is_uploaded_again() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("a.txt", "alpha"), ("b.txt", "beta")]);

    let counting = Arc::new(CountingService::new(http_service(&server)));
    let sync = SyncFilesUseCase::connect(counting.clone()).await.unwrap();
    sync.execute(&paths).await.unwrap();
    assert_eq!(counting.uploaded(), 2);

    write_files(&dir, &[("a.txt", "alpha, revised")]);
    sync.execute(&paths).await.unwrap();
    assert_eq!(counting.uploaded(), 3);

    let response = http_service(&server)
        .stat(&["a.txt".to_string()])
        .await
        .unwrap();
    assert_eq!(response.stat.len(), 1);
    assert_eq!(
        response.stat[0].md5,
        ContentDigest::of_bytes(b"alpha, revised").as_hex()
    );
}

#[tokio::test]
async fn test_short_acknowledgement_fails_the_batch() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("a.txt", "1"), ("b.txt", "2")]);

    let sync = SyncFilesUseCase::connect(Arc::new(ShortAckService)).await.unwrap();
    let err = sync.execute(&paths).await.unwrap_err();
    assert_eq!(err.to_string(), "Expected 2 files, but received 1");

    match err {
        SyncError::CountMismatch { expected, received } => {
            assert_eq!(expected, 2);
            assert_eq!(received, 1);
        }
        other => panic!("expected CountMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server() {
    let service = HttpBlobService::new("http://127.0.0.1:9/v1/api/blobserver", Duration::from_secs(2))
        .unwrap();
    let err = SyncFilesUseCase::connect(Arc::new(service)).await.err().unwrap();
    assert!(matches!(err, SyncError::Client(ClientError::Transport(_))));
}

#[tokio::test]
async fn test_sync_result_encodes_as_json_mapping() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let paths = write_files(&dir, &[("b.txt", "beta"), ("a.txt", "alpha")]);

    let sync = SyncFilesUseCase::connect(http_service(&server)).await.unwrap();
    let resources = sync.execute(&paths).await.unwrap();

    let mut encoder = JsonEncoder::new(Vec::new());
    encoder.encode(&resources).unwrap();
    let output = String::from_utf8(encoder.into_inner()).unwrap();
    assert!(output.ends_with('\n'));

    let mapping: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(output.trim_end()).unwrap();
    let keys: Vec<&String> = mapping.keys().collect();
    assert_eq!(
        keys,
        vec![
            &paths[1].display().to_string(),
            &paths[0].display().to_string()
        ]
    );
    for resource in resources.iter() {
        assert_eq!(
            mapping[&resource.path().display().to_string()],
            resource.url().unwrap()
        );
    }
}

#[tokio::test]
async fn test_lifecycle_over_every_shard_container() {
    let root = TempDir::new().unwrap();
    let local = LocalContainerBackend::with_durability(root.path().to_path_buf(), false);
    local.init().await.unwrap();
    let backend: Arc<dyn ObjectBackend> = Arc::new(local);

    let store = ShardedBlobStore::with_read_acl(Arc::clone(&backend), "ctest-", DEFAULT_READ_ACL);
    let containers = store.container_names();
    assert_eq!(containers.len(), SHARD_COUNT);
    assert_eq!(containers[0], "ctest-000");
    assert_eq!(containers[SHARD_COUNT - 1], "ctest-3ff");

    let pipeline = LifecyclePipeline::standard(
        Arc::clone(&backend),
        DEFAULT_READ_ACL,
        PipelineConfig::default(),
    );
    let report = pipeline.run(containers).await.unwrap();
    assert_eq!(report.completed, SHARD_COUNT);

    // Every container was deleted again.
    let leftovers = std::fs::read_dir(root.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("ctest-"))
        .count();
    assert_eq!(leftovers, 0);
}
