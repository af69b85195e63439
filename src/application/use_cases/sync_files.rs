use futures_util::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::application::dto::StatItem;
use crate::application::ports::{BlobService, ClientError, UploadFile};
use crate::domain::entities::{Resource, Resources};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ContentDigest, DigestBuilder};

const READ_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Blob server error: {0}")]
    Client(#[from] ClientError),

    #[error("Expected {expected} files, but received {received}")]
    CountMismatch { expected: usize, received: usize },

    #[error("File acknowledged more than once: {0}")]
    DuplicateAcknowledgement(String),
}

/// Use case: make a batch of local files available on the blob server,
/// transferring only the ones whose content the server does not already hold.
pub struct SyncFilesUseCase {
    service: Arc<dyn BlobService>,
    cdn_url: String,
}

impl SyncFilesUseCase {
    pub fn new(service: Arc<dyn BlobService>, cdn_url: impl Into<String>) -> Self {
        Self {
            service,
            cdn_url: cdn_url.into(),
        }
    }

    /// Build the use case with the CDN base URL the server advertises.
    pub async fn connect(service: Arc<dyn BlobService>) -> Result<Self, SyncError> {
        let config = service.config().await?;
        info!(cdn_url = %config.data.cdn_url, "Connected to blob server");
        Ok(Self::new(service, config.data.cdn_url))
    }

    pub fn cdn_url(&self) -> &str {
        &self.cdn_url
    }

    /// Execute the full workflow: digest, stat, upload.
    pub async fn execute(&self, paths: &[PathBuf]) -> Result<Resources, SyncError> {
        let mut resources = Self::digest_files(paths).await?;
        self.stat(&mut resources).await?;
        self.upload(&mut resources).await?;
        Ok(resources)
    }

    /// Read and digest every file concurrently. All digests complete before
    /// anything is sent.
    pub async fn digest_files(paths: &[PathBuf]) -> Result<Resources, SyncError> {
        let resources = try_join_all(paths.iter().map(digest_resource)).await?;

        Ok(Resources::new(resources)?)
    }

    /// Phase 1: ask the server which files it already holds with identical
    /// content, and mark those as not needing an upload.
    pub async fn stat(&self, resources: &mut Resources) -> Result<(), SyncError> {
        if resources.is_empty() {
            return Ok(());
        }

        let filenames: Vec<String> = resources
            .iter()
            .map(|r| r.filename().to_string())
            .collect();
        let response = self.service.stat(&filenames).await?;

        let mut entries: HashMap<usize, Vec<&StatItem>> = HashMap::new();
        for item in &response.stat {
            match resources.position_for_remote_path(&item.path) {
                Ok(index) => entries.entry(index).or_default().push(item),
                Err(e) => warn!(path = %item.path, error = %e, "Skipping stat entry"),
            }
        }

        for index in 0..resources.len() {
            let Some(resource) = resources.get_mut(index) else {
                continue;
            };
            match entries.get(&index).map(Vec::as_slice) {
                None | Some([]) => {
                    warn!(filename = resource.filename(), "Not stored remotely");
                }
                Some([item]) => {
                    let url = join_url(&self.cdn_url, &item.path);
                    if resource.md5().matches(&item.md5) {
                        debug!(filename = resource.filename(), url = %url, "Unchanged");
                        resource.mark_unchanged(url);
                    } else {
                        debug!(
                            filename = resource.filename(),
                            local = %resource.md5(),
                            remote = %item.md5,
                            "Content changed"
                        );
                    }
                }
                Some(items) => {
                    warn!(
                        filename = resource.filename(),
                        entries = items.len(),
                        "Ambiguous stat entries, uploading again"
                    );
                }
            }
        }

        Ok(())
    }

    /// Phase 2: upload every resource still pending in one request.
    ///
    /// Every pending file must be acknowledged exactly once. Acknowledgements
    /// are correlated before any URL is applied, so a failed batch leaves
    /// every resource untouched.
    pub async fn upload(&self, resources: &mut Resources) -> Result<(), SyncError> {
        let pending = resources.pending();
        if pending.is_empty() {
            info!("Nothing to upload");
            return Ok(());
        }

        let files: Vec<UploadFile> = pending
            .iter()
            .filter_map(|&i| resources.get(i))
            .map(|r| UploadFile {
                filename: r.filename().to_string(),
                path: r.path().to_path_buf(),
            })
            .collect();

        info!(count = files.len(), "Uploading files");
        let response = self.service.upload(&files).await?;

        if response.received.len() != pending.len() {
            return Err(SyncError::CountMismatch {
                expected: pending.len(),
                received: response.received.len(),
            });
        }

        let pending_set: HashSet<usize> = pending.iter().copied().collect();
        let mut unacknowledged = pending_set.clone();
        let mut updates = Vec::with_capacity(response.received.len());
        for item in &response.received {
            let index = resources.position_for_remote_path(&item.path)?;
            if !pending_set.contains(&index) {
                return Err(DomainError::UnmatchedRemotePath(item.path.clone()).into());
            }
            if !unacknowledged.remove(&index) {
                return Err(SyncError::DuplicateAcknowledgement(item.path.clone()));
            }
            updates.push((index, join_url(&self.cdn_url, &item.path)));
        }

        for (index, url) in updates {
            if let Some(resource) = resources.get_mut(index) {
                debug!(filename = resource.filename(), url = %url, "Uploaded");
                resource.mark_uploaded(url);
            }
        }

        Ok(())
    }
}

async fn digest_resource(path: &PathBuf) -> Result<Resource, SyncError> {
    let md5 = digest_file(path).await.map_err(|source| SyncError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), md5 = %md5, "Digested file");
    Ok(Resource::new(path.clone(), md5)?)
}

async fn digest_file(path: &Path) -> std::io::Result<ContentDigest> {
    let mut file = File::open(path).await?;
    let mut builder = DigestBuilder::new();
    let mut buffer = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        builder.update(&buffer[..n]);
    }

    Ok(builder.finish())
}

/// CDN base URL plus a backend-relative path, with exactly one `/` between.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
