//! In-memory vector index using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a dependency-free
//! [`VectorIndex`] backed by a `Vec` per collection and protected by a
//! `tokio::sync::RwLock`. It is suitable for development, tests, and small
//! knowledge bases.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::Document;
use crate::embedding::check_dimensions;
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorIndex, VectorMatch};

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    /// Documents in insertion order; replacing an id keeps its position.
    documents: Vec<Document>,
}

/// An in-memory vector index using cosine similarity for search.
///
/// Query results are ordered by descending cosine similarity; equal scores
/// keep insertion order. The cosine similarity is reported as the native
/// score of each [`VectorMatch`].
///
/// # Example
///
/// ```rust,ignore
/// use yoda_rag::{InMemoryVectorStore, VectorIndex};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("yoda_documents", 384).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_collection(name: &str) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("collection '{name}' does not exist"),
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection { dimensions, documents: Vec::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn insert(&self, collection: &str, document: &Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;
        check_dimensions(&document.embedding, store.dimensions)?;

        match store.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document.clone(),
            None => store.documents.push(document.clone()),
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;
        store.documents.retain(|d| !ids.contains(&d.id.as_str()));
        Ok(())
    }

    async fn query_by_vector(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorMatch>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        check_dimensions(embedding, store.dimensions)?;

        let mut scored: Vec<VectorMatch> = store
            .documents
            .iter()
            .map(|doc| VectorMatch {
                document: doc.without_embedding(),
                score: Some(cosine_similarity(&doc.embedding, embedding)),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing_collection(collection))?;
        Ok(store.documents.iter().map(Document::without_embedding).collect())
    }
}
