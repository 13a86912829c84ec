//! Text ingestion: split → embed → store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::chunking::{RecursiveSplitter, TextSplitter};
use crate::config::ChunkingConfig;
use crate::document::{Document, DocumentType};
use crate::embedding::{EmbeddingProvider, check_dimensions};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// Metadata copied onto every chunk of an ingested text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Title of the source document.
    #[serde(default)]
    pub title: String,
    /// Kind of source document.
    #[serde(default, rename = "type")]
    pub doc_type: DocumentType,
    /// Free-form tags, kept in order.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Splits plain text into chunks, embeds them in one batch, and inserts each
/// chunk into the vector index as a [`Document`].
///
/// Newly ingested documents reach the lexical branch of a
/// [`HybridRetriever`](crate::HybridRetriever) only after its next refresh.
pub struct DocumentIngestor {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    splitter: Arc<dyn TextSplitter>,
    min_chunk_len: usize,
}

impl DocumentIngestor {
    /// Create an ingestor using the recursive splitter configured by `chunking`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the chunking settings are inconsistent.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        let splitter = RecursiveSplitter::from_config(&chunking)?;
        Ok(Self {
            embedder,
            index,
            collection: collection.into(),
            splitter: Arc::new(splitter),
            min_chunk_len: chunking.min_chunk_len,
        })
    }

    /// Replace the text splitter.
    pub fn with_splitter(mut self, splitter: Arc<dyn TextSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    /// Split `text` into trimmed chunks, dropping those shorter than the minimum length.
    pub fn chunks(&self, text: &str) -> Vec<String> {
        self.splitter
            .split(text)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty() && chunk.chars().count() >= self.min_chunk_len)
            .collect()
    }

    /// Ingest `text`, returning the stored documents without embeddings.
    ///
    /// Every chunk gets a fresh UUID v4 id and a copy of `metadata`. Text that
    /// yields no usable chunks stores nothing and returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns the embedder's error if batch embedding fails,
    /// [`RagError::InvalidEmbedding`] if any vector has the wrong size (nothing
    /// is stored), or the index's error if the collection cannot be created or
    /// an insert fails. Chunks inserted before a failed insert are deleted again.
    #[instrument(
        skip(self, text, metadata),
        fields(collection = %self.collection, text_len = text.len())
    )]
    pub async fn ingest(&self, text: &str, metadata: &DocumentMetadata) -> Result<Vec<Document>> {
        let chunks = self.chunks(text);
        if chunks.is_empty() {
            info!(chunk_count = 0, "ingested text (no usable chunks)");
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(error = %e, "embedding failed during ingestion");
            e
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: "ingest".to_string(),
                message: format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            });
        }

        let dimensions = self.embedder.dimensions();
        for embedding in &embeddings {
            check_dimensions(embedding, dimensions).inspect_err(|e| {
                error!(error = %e, "embedder returned a malformed vector during ingestion");
            })?;
        }
        self.index.create_collection(&self.collection, dimensions).await?;

        let mut stored = Vec::with_capacity(chunks.len());
        for (content, embedding) in chunks.into_iter().zip(embeddings) {
            let document = Document::new(Uuid::new_v4().to_string(), content)
                .with_title(metadata.title.clone())
                .with_type(metadata.doc_type)
                .with_tags(metadata.tags.iter().cloned())
                .with_embedding(embedding);

            if let Err(e) = self.index.insert(&self.collection, &document).await {
                error!(document.id = %document.id, error = %e, "insert failed during ingestion");
                self.rollback(&stored).await;
                return Err(e);
            }
            stored.push(document.without_embedding());
        }

        info!(chunk_count = stored.len(), "ingested text");
        Ok(stored)
    }

    /// Remove chunks stored by an ingestion that failed partway.
    async fn rollback(&self, stored: &[Document]) {
        if stored.is_empty() {
            return;
        }
        let ids: Vec<&str> = stored.iter().map(|doc| doc.id.as_str()).collect();
        if let Err(e) = self.index.delete(&self.collection, &ids).await {
            error!(orphaned = ids.len(), error = %e, "failed to remove partially ingested chunks");
        }
    }
}
