use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::handlers::{
    config_handler, fetch_handler, fetch_in_container_handler, health_handler, readiness_handler,
    stat_handler, upload_handler,
};
use crate::application::dto::ConfigResponse;
use crate::application::use_cases::{FetchBlobUseCase, StatBlobsUseCase, UploadBlobsUseCase};
use crate::infrastructure::storage::ShardedBlobStore;

/// Application state container
pub struct AppState {
    pub config: Arc<ConfigResponse>,
    pub store: Arc<ShardedBlobStore>,
    pub stat_use_case: Arc<StatBlobsUseCase>,
    pub upload_use_case: Arc<UploadBlobsUseCase>,
    pub fetch_use_case: Arc<FetchBlobUseCase>,
}

/// Create router with all routes.
///
/// Blob routes are nested under `base_path` (e.g. `/v1/api/blobserver`);
/// health probes stay at the root.
pub fn create_router(state: AppState, base_path: &str, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .route("/config/", get(config_handler).with_state(state.config))
        .route(
            "/blob/stat/",
            get(stat_handler).with_state(state.stat_use_case),
        )
        .route(
            "/blob/upload/",
            post(upload_handler).with_state(state.upload_use_case),
        )
        .route(
            "/blob/fetch/{name}",
            get(fetch_handler).with_state(Arc::clone(&state.fetch_use_case)),
        )
        .route(
            "/blob/fetch/{container}/{name}",
            get(fetch_in_container_handler).with_state(state.fetch_use_case),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes));

    let base_path = base_path.trim_end_matches('/');
    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/health/ready",
            get(readiness_handler).with_state(state.store),
        );

    if base_path.is_empty() {
        router.merge(api)
    } else {
        router.nest(base_path, api)
    }
}
