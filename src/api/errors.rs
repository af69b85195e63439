use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::ports::StorageError;
use crate::application::use_cases::{FetchError, StatError, UploadError};

/// API error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
        }));

        (self.status, body).into_response()
    }
}

// Convert use case errors to API errors

fn storage_error(err: StorageError) -> ApiError {
    match err {
        StorageError::NotFound(msg) => ApiError::not_found(msg),
        StorageError::Domain(e) => ApiError::bad_request(e.to_string()),
        other => ApiError::internal_error(format!("Storage error: {}", other)),
    }
}

impl From<StatError> for ApiError {
    fn from(err: StatError) -> Self {
        match err {
            StatError::Domain(e) => ApiError::bad_request(e.to_string()),
            StatError::Storage(e) => storage_error(e),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidRequest(msg) => ApiError::bad_request(msg),
            UploadError::Domain(e) => ApiError::bad_request(e.to_string()),
            UploadError::Storage(e) => storage_error(e),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(msg) => ApiError::not_found(format!("Blob not found: {}", msg)),
            FetchError::Domain(e) => ApiError::bad_request(e.to_string()),
            FetchError::Storage(e) => storage_error(e),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::new(err.status(), format!("Invalid multipart body: {}", err.body_text()))
    }
}
