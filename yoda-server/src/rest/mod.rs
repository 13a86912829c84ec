pub mod controllers;
pub mod response;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use controllers::{documents, index, query};

/// Build the HTTP router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(index::health))
        .route("/api/query", post(query::process_query))
        .route("/api/documents", post(documents::ingest_document))
        .route("/api/index/refresh", post(index::refresh_index))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
