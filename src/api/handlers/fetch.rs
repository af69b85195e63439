use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::errors::ApiError;
use crate::application::use_cases::{FetchBlobUseCase, FetchedBlob};

/// GET /blob/fetch/{name}
/// Stream a stored blob
pub async fn fetch_handler(
    State(use_case): State<Arc<FetchBlobUseCase>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    blob_response(use_case.execute(&name).await?)
}

/// GET /blob/fetch/{container}/{name}
/// Stream a stored blob by the path stat and upload report
pub async fn fetch_in_container_handler(
    State(use_case): State<Arc<FetchBlobUseCase>>,
    Path((container, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    blob_response(use_case.execute_in(&container, &name).await?)
}

fn blob_response(fetched: FetchedBlob) -> Result<Response, ApiError> {
    let body = Body::from_stream(ReaderStream::new(fetched.blob.open()));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, fetched.blob.size().to_string())
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::ETAG, format!("\"{}\"", fetched.md5))
        .body(body)
        .map_err(|e| ApiError::internal_error(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
