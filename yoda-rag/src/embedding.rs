//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// The hybrid retriever and the vector index must agree on
/// [`dimensions`](EmbeddingProvider::dimensions); vectors of any other length
/// are rejected with [`RagError::InvalidEmbedding`].
///
/// # Example
///
/// ```rust,ignore
/// use yoda_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("What is the minimum FD tenure?").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially. Backends with native batching should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Check that `embedding` is non-empty and has exactly `expected` dimensions.
pub fn check_dimensions(embedding: &[f32], expected: usize) -> Result<()> {
    if embedding.is_empty() || embedding.len() != expected {
        return Err(RagError::InvalidEmbedding { expected, actual: embedding.len() });
    }
    Ok(())
}
