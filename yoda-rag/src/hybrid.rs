//! Hybrid dense + lexical retrieval.
//!
//! [`HybridRetriever`] answers a query by running two branches and fusing
//! their rankings with reciprocal rank fusion:
//!
//! - **dense**: embed the query and ask the [`VectorIndex`] for its nearest
//!   neighbours;
//! - **sparse**: BM25-score every document of an in-memory snapshot of the
//!   collection.
//!
//! The snapshot is loaded once, on the first [`initialize`](HybridRetriever::initialize)
//! or [`search`](HybridRetriever::search), and is only reloaded by an explicit
//! [`refresh`](HybridRetriever::refresh). Documents inserted into the store
//! afterwards are visible to the dense branch immediately and to the sparse
//! branch after the next refresh.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yoda_rag::{HybridRetriever, InMemoryVectorStore, RetrieverConfig};
//!
//! let retriever = HybridRetriever::new(
//!     RetrieverConfig::builder().dimensions(embedder.dimensions()).build()?,
//!     Arc::new(embedder),
//!     Arc::new(InMemoryVectorStore::new()),
//! )?;
//! let documents = retriever.search("What is the minimum FD tenure?", 5).await?;
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

use crate::config::RetrieverConfig;
use crate::document::{Document, SearchResult};
use crate::embedding::{EmbeddingProvider, check_dimensions};
use crate::error::{RagError, Result, SearchBranch};
use crate::fusion::reciprocal_rank_fusion;
use crate::lexical::LexicalCorpus;
use crate::vectorstore::{VectorIndex, VectorMatch};

/// Combines dense vector search and BM25 over a cached document snapshot.
///
/// The retriever is shared behind an `Arc` by concurrent queries. The lexical
/// cache is read-only between (re)loads; loads are serialized so concurrent
/// first callers wait for a single initialization instead of racing.
pub struct HybridRetriever {
    config: RetrieverConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    corpus: RwLock<Option<Arc<LexicalCorpus>>>,
    load_lock: Mutex<()>,
}

impl HybridRetriever {
    /// Create a retriever. No I/O happens until the first initialization.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidEmbedding`] if the embedder's dimensionality
    /// differs from `config.dimensions`.
    pub fn new(
        config: RetrieverConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        if embedder.dimensions() != config.dimensions {
            return Err(RagError::InvalidEmbedding {
                expected: config.dimensions,
                actual: embedder.dimensions(),
            });
        }
        Ok(Self {
            config,
            embedder,
            index,
            corpus: RwLock::new(None),
            load_lock: Mutex::new(()),
        })
    }

    /// Return a reference to the retriever configuration.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Whether the lexical cache has been loaded.
    pub async fn is_initialized(&self) -> bool {
        self.corpus.read().await.is_some()
    }

    /// Number of documents in the lexical cache, or `None` before initialization.
    pub async fn cached_len(&self) -> Option<usize> {
        self.corpus.read().await.as_ref().map(|corpus| corpus.len())
    }

    /// Attach to (or create) the collection and load the lexical cache.
    ///
    /// Runs at most once: later calls, including concurrent ones that lose the
    /// race, return without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InitializationError`] if the collection cannot be
    /// created or enumerated.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_corpus().await.map(|_| ())
    }

    /// Reload the lexical cache from the vector store.
    ///
    /// Initializes the retriever if needed. Searches running concurrently keep
    /// using the previous snapshot until the new one is in place. Returns the
    /// number of cached documents.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InitializationError`] if the store cannot be read;
    /// the previous snapshot is kept in that case.
    #[instrument(skip(self), fields(collection = %self.config.collection))]
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.load_lock.lock().await;
        let corpus = self.load_corpus().await?;
        let len = corpus.len();
        *self.corpus.write().await = Some(corpus);
        info!(cached = len, "lexical cache refreshed");
        Ok(len)
    }

    async fn ensure_corpus(&self) -> Result<Arc<LexicalCorpus>> {
        if let Some(corpus) = self.corpus.read().await.as_ref() {
            return Ok(Arc::clone(corpus));
        }

        let _guard = self.load_lock.lock().await;
        if let Some(corpus) = self.corpus.read().await.as_ref() {
            return Ok(Arc::clone(corpus));
        }

        let corpus = self.load_corpus().await?;
        *self.corpus.write().await = Some(Arc::clone(&corpus));
        info!(collection = %self.config.collection, cached = corpus.len(), "retriever initialized");
        Ok(corpus)
    }

    /// Callers must hold `load_lock`.
    async fn load_corpus(&self) -> Result<Arc<LexicalCorpus>> {
        let collection = self.config.collection.as_str();

        self.index.create_collection(collection, self.config.dimensions).await.map_err(|e| {
            error!(
                collection,
                backend = self.index.backend(),
                error = %e,
                "failed to attach collection"
            );
            RagError::InitializationError(format!(
                "failed to attach to collection '{collection}' on {}: {e}",
                self.index.backend()
            ))
        })?;

        let documents = self.index.list_all(collection).await.map_err(|e| {
            error!(
                collection,
                backend = self.index.backend(),
                error = %e,
                "failed to list documents"
            );
            RagError::InitializationError(format!(
                "failed to load documents from collection '{collection}': {e}"
            ))
        })?;

        debug!(collection, count = documents.len(), "loaded lexical cache");
        Ok(Arc::new(LexicalCorpus::new(documents)))
    }

    /// Search with the configured default limit.
    pub async fn search_default(&self, query: &str) -> Result<Vec<Document>> {
        self.search(query, self.config.default_limit).await
    }

    /// Return the top `limit` documents for `query`, best first.
    ///
    /// Returned documents carry no embedding. An empty store and empty cache
    /// produce an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] for a blank query, and
    /// [`RagError::SearchFailed`] naming the failing branch if initialization,
    /// embedding, the vector query, or lexical scoring fails. No partial
    /// result is returned.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        let fused = self.search_scored(query, limit).await?;
        Ok(fused.into_iter().map(|result| result.document).collect())
    }

    /// Like [`search`](Self::search), but keeps each document's fused RRF score.
    #[instrument(
        skip(self, query),
        fields(collection = %self.config.collection, query_len = query.len())
    )]
    pub async fn search_scored(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query must not be empty".to_string()));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let corpus = self
            .ensure_corpus()
            .await
            .map_err(|e| RagError::search_failed(SearchBranch::Initialization, e))?;

        let candidates = limit.saturating_mul(self.config.candidate_multiplier);
        let (dense, sparse) = futures::try_join!(
            self.dense_branch(query, candidates),
            self.sparse_branch(corpus, query, candidates)
        )?;

        debug!(dense = dense.len(), sparse = sparse.len(), "fusing ranked lists");

        let mut fused = reciprocal_rank_fusion(&[dense, sparse], self.config.rrf_k);
        fused.truncate(limit);
        for result in &mut fused {
            result.document.embedding.clear();
        }

        info!(result_count = fused.len(), "hybrid search completed");
        Ok(fused)
    }

    async fn dense_branch(&self, query: &str, candidates: usize) -> Result<Vec<SearchResult>> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .and_then(|embedding| {
                check_dimensions(&embedding, self.config.dimensions)?;
                Ok(embedding)
            })
            .map_err(|e| {
                error!(error = %e, "query embedding failed");
                RagError::search_failed(SearchBranch::Embedding, e)
            })?;

        let matches = self
            .index
            .query_by_vector(&self.config.collection, &embedding, candidates)
            .await
            .map_err(|e| {
                error!(backend = self.index.backend(), error = %e, "vector query failed");
                RagError::search_failed(SearchBranch::Dense, e)
            })?;

        Ok(dense_results(matches))
    }

    async fn sparse_branch(
        &self,
        corpus: Arc<LexicalCorpus>,
        query: &str,
        candidates: usize,
    ) -> Result<Vec<SearchResult>> {
        if corpus.is_empty() {
            return Ok(Vec::new());
        }

        let query = query.to_string();
        let params = self.config.bm25;
        let normalization = self.config.length_normalization;
        tokio::task::spawn_blocking(move || {
            corpus.rank(&query, &params, normalization, candidates)
        })
        .await
        .map_err(scoring_task_failed)
    }
}

fn scoring_task_failed(e: tokio::task::JoinError) -> RagError {
    error!(error = %e, "lexical scoring task failed");
    RagError::search_failed(
        SearchBranch::Sparse,
        RagError::TaskFailed { task: "lexical scoring", message: e.to_string() },
    )
}

/// Convert vector hits into scored results.
///
/// Native similarity scores are used as-is; hits without one get the
/// position-based score `1 - rank / total`.
pub fn dense_results(matches: Vec<VectorMatch>) -> Vec<SearchResult> {
    let total = matches.len();
    matches
        .into_iter()
        .enumerate()
        .map(|(rank, hit)| SearchResult {
            score: hit.score.unwrap_or(1.0 - rank as f32 / total as f32),
            document: hit.document,
        })
        .collect()
}
