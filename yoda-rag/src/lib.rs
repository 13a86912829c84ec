//! Hybrid retrieval-augmented answering for the Yoda financial-services assistant.
//!
//! This crate provides:
//! - BM25 lexical scoring over an in-memory document snapshot
//! - Dense nearest-neighbour search through a pluggable [`VectorIndex`]
//! - Reciprocal rank fusion of the two ranked lists
//! - Prompted answer generation with replaceable confidence scoring
//! - Plain-text ingestion (split → embed → store)
//!
//! Optional backends are enabled with the `openai` and `qdrant` features.

pub mod chunking;
pub mod confidence;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fusion;
pub mod generator;
pub mod hybrid;
pub mod inmemory;
pub mod ingest;
pub mod lexical;
pub mod pipeline;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{RecursiveSplitter, TextSplitter};
pub use confidence::{ConfidenceScorer, FixedConfidence, HeuristicConfidence};
pub use config::{
    ChunkingConfig, DEFAULT_COLLECTION, DEFAULT_DIMENSIONS, PipelineConfig, PipelineConfigBuilder,
    RetrieverConfig, RetrieverConfigBuilder,
};
pub use document::{Document, DocumentType, ProcessedQuery, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{ErrorStage, RagError, Result, SearchBranch};
pub use fusion::{DEFAULT_RRF_K, reciprocal_rank_fusion};
pub use generator::{AnswerGenerator, LanguageModel, LlmAnswerGenerator, RESPONSE_PROMPT_TEMPLATE};
pub use hybrid::HybridRetriever;
pub use inmemory::InMemoryVectorStore;
pub use ingest::{DocumentIngestor, DocumentMetadata};
pub use lexical::{Bm25Params, LengthNormalization, LexicalCorpus};
pub use pipeline::{QueryPipeline, QueryPipelineBuilder};
pub use vectorstore::{VectorIndex, VectorMatch};

#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
