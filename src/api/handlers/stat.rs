use axum::{
    extract::{Query, State},
    response::Json,
};
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::application::dto::StatResponse;
use crate::application::use_cases::StatBlobsUseCase;

/// GET /blob/stat/?blob=<name>&blob=...
pub async fn stat_handler(
    State(use_case): State<Arc<StatBlobsUseCase>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<StatResponse>, ApiError> {
    let names: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == "blob")
        .map(|(_, value)| value)
        .collect();

    let response = use_case.execute(&names).await?;
    Ok(Json(response))
}
