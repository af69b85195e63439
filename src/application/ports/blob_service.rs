use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use std::path::PathBuf;
use thiserror::Error;

use crate::application::dto::{ConfigResponse, StatResponse, UploadResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A local file offered to the upload endpoint under `filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub path: PathBuf,
}

/// Port for the remote blob server.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobService: Send + Sync {
    /// `GET /config/`
    async fn config(&self) -> Result<ConfigResponse, ClientError>;

    /// `GET /blob/stat/` with one `blob` parameter per filename.
    async fn stat(&self, filenames: &[String]) -> Result<StatResponse, ClientError>;

    /// `POST /blob/upload/?use-filename=true`, one multipart `file` part per
    /// file. Anything but `201 Created` is an error.
    async fn upload(&self, files: &[UploadFile]) -> Result<UploadResponse, ClientError>;
}
