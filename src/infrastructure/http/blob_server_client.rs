use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::application::dto::{ConfigResponse, StatResponse, UploadResponse};
use crate::application::ports::{BlobService, ClientError, UploadFile};

/// Blob server client over HTTP.
///
/// `base_url` is the server address including the API base path, e.g.
/// `http://localhost:6064/v1/api/blobserver`.
pub struct HttpBlobService {
    client: Client,
    base_url: String,
}

impl HttpBlobService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Decode a JSON body after checking status and content type.
    async fn decode<T: DeserializeOwned>(
        response: Response,
        expected: StatusCode,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status != expected {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            return Err(ClientError::Protocol(format!(
                "Expected JSON response, got content type {:?}",
                content_type
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::Protocol(format!("Invalid response body: {}", e)))
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

#[async_trait]
impl BlobService for HttpBlobService {
    async fn config(&self) -> Result<ConfigResponse, ClientError> {
        let response = self
            .client
            .get(self.url("/config/"))
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response, StatusCode::OK).await
    }

    async fn stat(&self, filenames: &[String]) -> Result<StatResponse, ClientError> {
        let query: Vec<(&str, &str)> = filenames.iter().map(|f| ("blob", f.as_str())).collect();
        debug!(count = filenames.len(), "Stat request");

        let response = self
            .client
            .get(self.url("/blob/stat/"))
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response, StatusCode::OK).await
    }

    async fn upload(&self, files: &[UploadFile]) -> Result<UploadResponse, ClientError> {
        let mut form = Form::new();
        for file in files {
            let handle = File::open(&file.path).await?;
            let len = handle.metadata().await?.len();
            let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(handle)), len)
                .file_name(file.filename.clone());
            form = form.part("file", part);
        }
        debug!(count = files.len(), "Upload request");

        let response = self
            .client
            .post(self.url("/blob/upload/"))
            .query(&[("use-filename", "true")])
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response, StatusCode::CREATED).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let service = HttpBlobService::with_client(Client::new(), "http://localhost:6064/v1/api/blobserver/");
        assert_eq!(
            service.url("/blob/stat/"),
            "http://localhost:6064/v1/api/blobserver/blob/stat/"
        );
    }
}
