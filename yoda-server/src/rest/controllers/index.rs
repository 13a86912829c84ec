use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::{Value, json};

use crate::rest::response::{ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub documents: usize,
}

pub async fn refresh_index(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let documents = state.pipeline.retriever().refresh().await.map_err(|err| {
        tracing::error!(error = %err, "lexical cache refresh failed");
        ApiError::Internal("Failed to refresh index".to_string())
    })?;
    Ok(ApiResponse::ok(RefreshResponse { documents }, "Index refreshed"))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
