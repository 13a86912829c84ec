use std::sync::Arc;

use yoda_rag::{
    ConfidenceScorer, DocumentIngestor, EmbeddingProvider, FixedConfidence, HeuristicConfidence,
    HybridRetriever, InMemoryVectorStore, OpenAIChatModel, OpenAIEmbeddingProvider, QueryPipeline,
    VectorIndex,
};

use crate::config::{ConfidenceMode, ServerConfig};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
    pub ingestor: Arc<DocumentIngestor>,
    /// Reload the lexical cache after each successful upload.
    pub refresh_on_ingest: bool,
}

impl AppState {
    pub fn new(pipeline: Arc<QueryPipeline>, ingestor: Arc<DocumentIngestor>) -> Self {
        Self { pipeline, ingestor, refresh_on_ingest: false }
    }

    pub fn with_refresh_on_ingest(mut self, refresh: bool) -> Self {
        self.refresh_on_ingest = refresh;
        self
    }

    /// Wire the OpenAI clients, the vector index, the pipeline and the ingestor.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(
            OpenAIEmbeddingProvider::new(config.openai_api_key.clone())?
                .with_api_base(config.openai_api_base.clone())
                .with_model(config.embedding_model.clone())
                .with_dimensions(config.embedding_dimensions),
        );
        let model = Arc::new(
            OpenAIChatModel::new(config.openai_api_key.clone())?
                .with_api_base(config.openai_api_base.clone())
                .with_model(config.chat_model.clone()),
        );
        let index = vector_index(config)?;

        let retriever = Arc::new(HybridRetriever::new(
            config.retriever_config()?,
            embedder.clone(),
            index.clone(),
        )?);
        let scorer: Arc<dyn ConfidenceScorer> = match config.confidence {
            ConfidenceMode::Fixed => Arc::new(FixedConfidence::default()),
            ConfidenceMode::Heuristic => Arc::new(HeuristicConfidence),
        };
        let pipeline = QueryPipeline::builder()
            .config(config.pipeline_config()?)
            .retriever(retriever)
            .language_model(model)
            .confidence_scorer(scorer)
            .build()?;
        let ingestor = DocumentIngestor::new(
            embedder,
            index,
            config.collection.clone(),
            config.chunking_config(),
        )?;

        Ok(Self::new(Arc::new(pipeline), Arc::new(ingestor))
            .with_refresh_on_ingest(config.refresh_on_ingest))
    }
}

#[cfg(feature = "qdrant")]
fn vector_index(config: &ServerConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    use yoda_rag::QdrantVectorStore;

    match (&config.qdrant_url, &config.qdrant_api_key) {
        (Some(url), Some(key)) => Ok(Arc::new(QdrantVectorStore::with_api_key(url, key.clone())?)),
        (Some(url), None) => Ok(Arc::new(QdrantVectorStore::new(url)?)),
        (None, _) => Ok(in_memory()),
    }
}

#[cfg(not(feature = "qdrant"))]
fn vector_index(config: &ServerConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    if config.qdrant_url.is_some() {
        anyhow::bail!("QDRANT_URL is set but yoda-server was built without the `qdrant` feature");
    }
    Ok(in_memory())
}

fn in_memory() -> Arc<dyn VectorIndex> {
    tracing::warn!("QDRANT_URL not set, documents are kept in memory and lost on restart");
    Arc::new(InMemoryVectorStore::new())
}
