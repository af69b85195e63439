use axum::{extract::State, response::Json};
use std::sync::Arc;

use crate::application::dto::ConfigResponse;

/// GET /config/
/// Client-facing settings, currently the CDN base URL.
pub async fn config_handler(State(config): State<Arc<ConfigResponse>>) -> Json<ConfigResponse> {
    Json(config.as_ref().clone())
}
