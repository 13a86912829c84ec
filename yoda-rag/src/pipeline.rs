//! Query pipeline orchestrator.
//!
//! The [`QueryPipeline`] answers one query end to end: hybrid retrieval,
//! answer generation over the retrieved documents, and confidence scoring.
//!
//! # Example
//!
//! ```rust,ignore
//! use yoda_rag::{HeuristicConfidence, QueryPipeline, PipelineConfig};
//!
//! let pipeline = QueryPipeline::builder()
//!     .config(PipelineConfig::default())
//!     .retriever(Arc::new(retriever))
//!     .language_model(Arc::new(chat_model))
//!     .confidence_scorer(Arc::new(HeuristicConfidence))
//!     .build()?;
//!
//! let response = pipeline.process_query("What is the minimum FD tenure?").await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument};

use crate::config::PipelineConfig;
use crate::confidence::{ConfidenceScorer, FixedConfidence};
use crate::document::ProcessedQuery;
use crate::error::{RagError, Result};
use crate::generator::{AnswerGenerator, LanguageModel, LlmAnswerGenerator};
use crate::hybrid::HybridRetriever;

/// The query pipeline orchestrator.
///
/// Retrieval and generation run sequentially within one query; independent
/// queries may share one pipeline concurrently. Construct one via
/// [`QueryPipeline::builder()`].
pub struct QueryPipeline {
    config: PipelineConfig,
    retriever: Arc<HybridRetriever>,
    generator: Arc<dyn AnswerGenerator>,
    scorer: Arc<dyn ConfidenceScorer>,
}

impl QueryPipeline {
    /// Create a new [`QueryPipelineBuilder`].
    pub fn builder() -> QueryPipelineBuilder {
        QueryPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Return the retriever, e.g. to refresh its lexical cache.
    pub fn retriever(&self) -> &Arc<HybridRetriever> {
        &self.retriever
    }

    /// Answer `query`: retrieve → generate → score.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidQuery`] for an empty or whitespace-only query,
    ///   before any I/O.
    /// - [`RagError::SearchFailed`] or [`RagError::Timeout`] if retrieval fails.
    /// - [`RagError::GenerationFailed`] if the model call fails, times out, or
    ///   returns nothing usable. The error carries the retrieved sources.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn process_query(&self, query: &str) -> Result<ProcessedQuery> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query must not be empty".to_string()));
        }

        let sources = with_deadline(
            "retrieval",
            self.config.retrieval_timeout,
            self.retriever.search_default(query),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "retrieval failed");
            e
        })?;

        let generated = with_deadline(
            "generation",
            self.config.generation_timeout,
            self.generator.generate(query, &sources),
        )
        .await;

        let answer = match generated {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, source_count = sources.len(), "answer generation failed");
                let message = match e {
                    RagError::GenerationFailed { message, .. } => message,
                    other => other.to_string(),
                };
                return Err(RagError::GenerationFailed { message, sources });
            }
        };

        let confidence = self.scorer.score(&answer, &sources);
        info!(source_count = sources.len(), confidence, "query processed");

        Ok(ProcessedQuery { rewritten_query: query.to_string(), answer, confidence, sources })
    }
}

async fn with_deadline<T>(
    operation: &'static str,
    deadline: Option<Duration>,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| RagError::Timeout { operation, elapsed: limit })?,
        None => work.await,
    }
}

/// Builder for constructing a [`QueryPipeline`].
///
/// A retriever and either a generator or a language model are required. With
/// a language model, an [`LlmAnswerGenerator`] is built using the configured
/// context budget. The confidence scorer defaults to [`FixedConfidence`].
#[derive(Default)]
pub struct QueryPipelineBuilder {
    config: Option<PipelineConfig>,
    retriever: Option<Arc<HybridRetriever>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    model: Option<Arc<dyn LanguageModel>>,
    scorer: Option<Arc<dyn ConfidenceScorer>>,
}

impl QueryPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the hybrid retriever.
    pub fn retriever(mut self, retriever: Arc<HybridRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set a custom answer generator. Takes precedence over a language model.
    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Generate answers by prompting this language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the confidence scorer.
    pub fn confidence_scorer(mut self, scorer: Arc<dyn ConfidenceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Build the [`QueryPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the retriever is missing or neither
    /// a generator nor a language model was provided.
    pub fn build(self) -> Result<QueryPipeline> {
        let config = self.config.unwrap_or_default();
        let retriever = self
            .retriever
            .ok_or_else(|| RagError::ConfigError("retriever is required".to_string()))?;
        let generator: Arc<dyn AnswerGenerator> = match (self.generator, self.model) {
            (Some(generator), _) => generator,
            (None, Some(model)) => Arc::new(
                LlmAnswerGenerator::new(model)
                    .with_char_budget(config.context_char_budget)
                    .with_type_prefix(config.include_type_prefix),
            ),
            (None, None) => {
                return Err(RagError::ConfigError(
                    "generator or language_model is required".to_string(),
                ));
            }
        };
        let scorer = self.scorer.unwrap_or_else(|| Arc::new(FixedConfidence::default()));

        Ok(QueryPipeline { config, retriever, generator, scorer })
    }
}
