use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::application::dto::HealthResponse;
use crate::infrastructure::storage::ShardedBlobStore;

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health/ready
/// Readiness probe: the first shard container must answer.
pub async fn readiness_handler(
    State(store): State<Arc<ShardedBlobStore>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Some(container) = store.container_names().into_iter().next() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "storage": "no shard containers" })),
        );
    };

    let check = tokio::time::timeout(
        Duration::from_secs(2),
        store.backend().container_headers(&container),
    )
    .await;

    match check {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "storage": "ok" })),
        ),
        Ok(Err(e)) => {
            warn!(container = %container, error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "storage": e.to_string() })),
            )
        }
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "storage": "timeout" })),
        ),
    }
}
