//! HTTP surface for the Yoda question-answering service.
//!
//! Routes:
//! - `POST /api/query` answers a question from the knowledge base
//! - `POST /api/documents` chunks, embeds and stores plain text
//! - `POST /api/index/refresh` reloads the lexical search cache
//! - `GET /health`

pub mod config;
pub mod rest;
pub mod state;

pub use config::{ConfidenceMode, ServerConfig};
pub use rest::create_app;
pub use state::AppState;
