use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use yoda_rag::Document;

/// Success envelope shared by every `/api` endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self { success: true, data, message: message.into() })
    }
}

/// Failure envelope: `{ success: false, message }` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// Retrieval succeeded but no answer could be produced.
    Generation { message: String, sources: Vec<Document> },
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response(),
            ApiError::Generation { message, sources } => (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "success": false,
                    "message": "Failed to generate answer",
                    "error": message,
                    "data": { "sources": sources },
                })),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response(),
        }
    }
}
