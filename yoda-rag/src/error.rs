//! Error types for the `yoda-rag` crate.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::document::Document;

/// The part of hybrid retrieval that produced a [`RagError::SearchFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBranch {
    /// Lazy initialization of the retriever.
    Initialization,
    /// Query embedding.
    Embedding,
    /// Nearest-neighbour vector query.
    Dense,
    /// Lexical scoring over the cached documents.
    Sparse,
}

impl fmt::Display for SearchBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialization => "initialization",
            Self::Embedding => "embedding",
            Self::Dense => "dense",
            Self::Sparse => "sparse",
        };
        f.write_str(name)
    }
}

/// Where in the query flow an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    /// Input rejected before any I/O.
    Validation,
    /// Embedding, vector store, or lexical retrieval.
    Retrieval,
    /// Language-model answer generation.
    Generation,
}

/// Errors that can occur in retrieval and answering operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The query was empty or whitespace-only.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An embedding vector was empty or had the wrong dimensionality.
    #[error("Invalid embedding: expected {expected} dimensions, got {actual}")]
    InvalidEmbedding {
        /// The dimensionality the collection was created with.
        expected: usize,
        /// The dimensionality that was supplied.
        actual: usize,
    },

    /// The backing vector store could not be reached.
    #[error("Vector store unavailable ({backend}): {message}")]
    StoreUnavailable {
        /// The vector store backend.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Attaching to or creating the vector collection failed.
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// One of the retrieval branches failed; no partial result is returned.
    #[error("Search failed in {branch} branch: {source}")]
    SearchFailed {
        /// The branch that failed.
        branch: SearchBranch,
        /// The underlying cause.
        #[source]
        source: Box<RagError>,
    },

    /// The language model call failed or returned unusable output.
    #[error("Generation failed: {message}")]
    GenerationFailed {
        /// A description of the failure.
        message: String,
        /// Documents retrieved before generation failed.
        sources: Vec<Document>,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store rejected a request or returned data of an unexpected shape.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error returned by a language model provider.
    #[error("Model error ({provider}): {message}")]
    ModelError {
        /// The model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An operation did not complete within its deadline.
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The configured deadline.
        elapsed: Duration,
    },

    /// A background task panicked or was cancelled before finishing.
    #[error("Task failed ({task}): {message}")]
    TaskFailed {
        /// The work the task was doing.
        task: &'static str,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Wrap an error as a failure of the given retrieval branch.
    pub fn search_failed(branch: SearchBranch, source: RagError) -> Self {
        Self::SearchFailed { branch, source: Box::new(source) }
    }

    /// Classify the error by the stage of the query flow it came from.
    pub fn stage(&self) -> ErrorStage {
        match self {
            Self::InvalidQuery(_) | Self::ConfigError(_) => ErrorStage::Validation,
            Self::GenerationFailed { .. } | Self::ModelError { .. } => ErrorStage::Generation,
            _ => ErrorStage::Retrieval,
        }
    }
}

/// A convenience result type for retrieval and answering operations.
pub type Result<T> = std::result::Result<T, RagError>;
