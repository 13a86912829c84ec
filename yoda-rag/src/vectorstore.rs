//! Vector index trait consumed by the hybrid retriever.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

/// One nearest-neighbour hit from a [`VectorIndex`].
#[derive(Debug, Clone)]
pub struct VectorMatch {
    /// The stored document, without its embedding.
    pub document: Document,
    /// Native similarity score, if the backend exposes one.
    pub score: Option<f32>,
}

/// A keyed store of documents supporting nearest-neighbour queries.
///
/// Implementations own their connection state and handle their own
/// concurrency control; the retriever holds them behind an `Arc` and calls
/// them from concurrent queries without extra locking.
///
/// # Example
///
/// ```rust,ignore
/// use yoda_rag::{InMemoryVectorStore, VectorIndex};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("yoda_documents", 3072).await?;
/// store.insert("yoda_documents", &document).await?;
/// let hits = store.query_by_vector("yoda_documents", &query_embedding, 10).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Human-readable backend name used in logs and errors.
    fn backend(&self) -> &str;

    /// Attach to the named collection, creating it empty if it does not exist.
    ///
    /// Calling this on an existing collection is a no-op.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all of its documents.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Store a document's content, metadata, and embedding.
    ///
    /// A document with an existing id is replaced.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidEmbedding`](crate::RagError::InvalidEmbedding) if the
    /// embedding is empty or has the wrong dimensionality, and
    /// [`RagError::StoreUnavailable`](crate::RagError::StoreUnavailable) if the
    /// backend cannot be reached.
    async fn insert(&self, collection: &str, document: &Document) -> Result<()>;

    /// Remove documents by id. Unknown ids are ignored.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// Return up to `limit` nearest neighbours of `embedding`, best first.
    ///
    /// An empty collection yields an empty list.
    async fn query_by_vector(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorMatch>>;

    /// Enumerate every document in the collection, without embeddings.
    ///
    /// May be expensive; the retriever only calls it to (re)load its lexical cache.
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>>;
}
