use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use yoda_rag::{Document, DocumentMetadata, DocumentType};

use crate::rest::response::{ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<DocumentType>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub chunks: usize,
    pub documents: Vec<Document>,
}

pub async fn ingest_document(
    State(state): State<AppState>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<IngestResponse>>, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(rejection = %rejection.body_text(), "rejected document upload body");
            return Err(ApiError::BadRequest("Text is required".to_string()));
        }
    };
    let text = match request.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(ApiError::BadRequest("Text is required".to_string())),
    };
    let metadata = DocumentMetadata {
        title: request.title.unwrap_or_default(),
        doc_type: request.doc_type.unwrap_or_default(),
        tags: request.tags.unwrap_or_default(),
    };

    let documents = state.ingestor.ingest(&text, &metadata).await.map_err(|err| {
        tracing::error!(error = %err, "document ingestion failed");
        ApiError::Internal("Failed to process document".to_string())
    })?;

    if state.refresh_on_ingest && !documents.is_empty() {
        if let Err(err) = state.pipeline.retriever().refresh().await {
            tracing::warn!(error = %err, "lexical cache refresh after ingestion failed");
        }
    }

    let response = IngestResponse { chunks: documents.len(), documents };
    Ok(ApiResponse::ok(response, "Document processed successfully"))
}
