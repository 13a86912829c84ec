use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use yoda_rag::{ProcessedQuery, RagError};

use crate::rest::response::{ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

pub async fn process_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProcessedQuery>>, ApiError> {
    let query = match body {
        Ok(Json(QueryRequest { query: Some(query) })) if !query.trim().is_empty() => query,
        _ => return Err(ApiError::BadRequest("Query is required".to_string())),
    };

    match state.pipeline.process_query(&query).await {
        Ok(response) => Ok(ApiResponse::ok(response, "Query processed successfully")),
        Err(RagError::InvalidQuery(_)) => {
            Err(ApiError::BadRequest("Query is required".to_string()))
        }
        Err(RagError::GenerationFailed { message, sources }) => {
            tracing::warn!(error = %message, sources = sources.len(), "answer generation failed");
            Err(ApiError::Generation { message, sources })
        }
        Err(err) => {
            tracing::error!(error = %err, stage = ?err.stage(), "query failed");
            Err(ApiError::Internal("Failed to process query".to_string()))
        }
    }
}
