//! Configuration for the hybrid retriever, query pipeline, and ingestion.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::fusion::DEFAULT_RRF_K;
use crate::lexical::{Bm25Params, LengthNormalization};

/// The collection name used when none is configured.
pub const DEFAULT_COLLECTION: &str = "yoda_documents";

/// Dimensionality of `text-embedding-3-large`.
pub const DEFAULT_DIMENSIONS: usize = 3072;

/// Configuration parameters for the [`HybridRetriever`](crate::HybridRetriever).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrieverConfig {
    /// Name of the vector collection to attach to or create.
    pub collection: String,
    /// Embedding dimensionality the collection is created with.
    pub dimensions: usize,
    /// Number of documents returned by [`search_default`](crate::HybridRetriever::search_default).
    pub default_limit: usize,
    /// Each branch fetches `candidate_multiplier * limit` candidates before fusion.
    pub candidate_multiplier: usize,
    /// Reciprocal rank fusion constant.
    pub rrf_k: u32,
    /// BM25 parameters for the sparse branch.
    pub bm25: Bm25Params,
    /// Average document length used by the sparse branch.
    pub length_normalization: LengthNormalization,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            default_limit: 5,
            candidate_multiplier: 2,
            rrf_k: DEFAULT_RRF_K,
            bm25: Bm25Params::default(),
            length_normalization: LengthNormalization::default(),
        }
    }
}

impl RetrieverConfig {
    /// Create a new builder for constructing a [`RetrieverConfig`].
    pub fn builder() -> RetrieverConfigBuilder {
        RetrieverConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrieverConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrieverConfigBuilder {
    config: RetrieverConfig,
}

impl RetrieverConfigBuilder {
    /// Set the vector collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the embedding dimensionality.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Set the default number of results.
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Set the per-branch candidate multiplier.
    pub fn candidate_multiplier(mut self, multiplier: usize) -> Self {
        self.config.candidate_multiplier = multiplier;
        self
    }

    /// Set the reciprocal rank fusion constant.
    pub fn rrf_k(mut self, k: u32) -> Self {
        self.config.rrf_k = k;
        self
    }

    /// Set the BM25 parameters.
    pub fn bm25(mut self, params: Bm25Params) -> Self {
        self.config.bm25 = params;
        self
    }

    /// Choose how BM25 normalizes document length.
    pub fn length_normalization(mut self, normalization: LengthNormalization) -> Self {
        self.config.length_normalization = normalization;
        self
    }

    /// Build the [`RetrieverConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `collection` is empty
    /// - `dimensions`, `default_limit`, `candidate_multiplier` or `rrf_k` is zero
    /// - `bm25.k1` is negative or `bm25.b` is outside `[0, 1]`
    pub fn build(self) -> Result<RetrieverConfig> {
        let c = &self.config;
        if c.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection must not be empty".to_string()));
        }
        if c.dimensions == 0 {
            return Err(RagError::ConfigError("dimensions must be greater than zero".to_string()));
        }
        if c.default_limit == 0 {
            return Err(RagError::ConfigError(
                "default_limit must be greater than zero".to_string(),
            ));
        }
        if c.candidate_multiplier == 0 {
            return Err(RagError::ConfigError(
                "candidate_multiplier must be greater than zero".to_string(),
            ));
        }
        if c.rrf_k == 0 {
            return Err(RagError::ConfigError("rrf_k must be greater than zero".to_string()));
        }
        if c.bm25.k1.is_nan() || c.bm25.k1 < 0.0 {
            return Err(RagError::ConfigError(format!(
                "bm25.k1 ({}) must be non-negative",
                c.bm25.k1
            )));
        }
        if !(0.0..=1.0).contains(&c.bm25.b) {
            return Err(RagError::ConfigError(format!(
                "bm25.b ({}) must be within [0, 1]",
                c.bm25.b
            )));
        }
        Ok(self.config)
    }
}

/// Configuration for the [`QueryPipeline`](crate::QueryPipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum characters of document content placed in the prompt.
    pub context_char_budget: usize,
    /// Prefix each context entry with its document type, e.g. `[FAQ]`.
    pub include_type_prefix: bool,
    /// Deadline for retrieval (embedding, vector query, fusion).
    pub retrieval_timeout: Option<Duration>,
    /// Deadline for the language-model call.
    pub generation_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_char_budget: 4000,
            include_type_prefix: true,
            retrieval_timeout: None,
            generation_timeout: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the prompt context budget in characters.
    pub fn context_char_budget(mut self, budget: usize) -> Self {
        self.config.context_char_budget = budget;
        self
    }

    /// Enable or disable `[TYPE]` prefixes in the prompt context.
    pub fn include_type_prefix(mut self, include: bool) -> Self {
        self.config.include_type_prefix = include;
        self
    }

    /// Set a deadline for retrieval.
    pub fn retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.config.retrieval_timeout = Some(timeout);
        self
    }

    /// Set a deadline for answer generation.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = Some(timeout);
        self
    }

    /// Build the [`PipelineConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `context_char_budget` is zero or a
    /// timeout is zero.
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.context_char_budget == 0 {
            return Err(RagError::ConfigError(
                "context_char_budget must be greater than zero".to_string(),
            ));
        }
        for (name, timeout) in [
            ("retrieval_timeout", self.config.retrieval_timeout),
            ("generation_timeout", self.config.generation_timeout),
        ] {
            if timeout.is_some_and(|t| t.is_zero()) {
                return Err(RagError::ConfigError(format!("{name} must be non-zero")));
            }
        }
        Ok(self.config)
    }
}

/// Chunking parameters for text ingestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunks shorter than this (after trimming) are discarded.
    pub min_chunk_len: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200, min_chunk_len: 100 }
    }
}

impl ChunkingConfig {
    /// Validate that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}
