//! Deterministic test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use yoda_rag::{
    Document, EmbeddingProvider, HybridRetriever, InMemoryVectorStore, LanguageModel, RagError,
    Result, RetrieverConfig, VectorIndex, VectorMatch,
};

pub const COLLECTION: &str = "test_documents";

/// Words mapped to their own embedding dimension; the last dimension is a constant bias.
const VOCABULARY: &[&str] = &[
    "minimum", "tenure", "fd", "fixed", "deposits", "bonds", "shares", "unlisted", "kyc",
    "account", "interest", "fund", "nse", "payout", "withdrawal", "tax",
];

/// Embeds text as counts of vocabulary words plus a bias term, so cosine
/// similarity tracks word overlap.
#[derive(Default)]
pub struct VocabularyEmbedder {
    pub calls: AtomicUsize,
}

impl VocabularyEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn vocabulary_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; VOCABULARY.len() + 1];
    for word in text.split_whitespace() {
        let word: String =
            word.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase();
        if let Some(i) = VOCABULARY.iter().position(|v| *v == word) {
            vector[i] += 1.0;
        }
    }
    vector[VOCABULARY.len()] = 1.0;
    vector
}

pub fn dimensions() -> usize {
    VOCABULARY.len() + 1
}

#[async_trait]
impl EmbeddingProvider for VocabularyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vocabulary_embedding(text))
    }

    fn dimensions(&self) -> usize {
        dimensions()
    }
}

/// Always fails to embed.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError { provider: "test".into(), message: "quota exceeded".into() })
    }

    fn dimensions(&self) -> usize {
        dimensions()
    }
}

/// Reports the expected dimensionality but returns shorter vectors.
pub struct TruncatingEmbedder;

#[async_trait]
impl EmbeddingProvider for TruncatingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; 3])
    }

    fn dimensions(&self) -> usize {
        dimensions()
    }
}

/// Wraps an [`InMemoryVectorStore`], counting calls and optionally failing or stalling.
#[derive(Default)]
pub struct CountingIndex {
    pub inner: InMemoryVectorStore,
    pub creates: AtomicUsize,
    pub lists: AtomicUsize,
    pub list_delay: Option<Duration>,
    pub fail_list: bool,
    pub fail_query: bool,
    pub hide_scores: bool,
}

impl CountingIndex {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

fn unavailable() -> RagError {
    RagError::StoreUnavailable { backend: "counting".into(), message: "connection refused".into() }
}

#[async_trait]
impl VectorIndex for CountingIndex {
    fn backend(&self) -> &str {
        "counting"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_collection(name, dimensions).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn insert(&self, collection: &str, document: &Document) -> Result<()> {
        self.inner.insert(collection, document).await
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        self.inner.delete(collection, ids).await
    }

    async fn query_by_vector(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorMatch>> {
        if self.fail_query {
            return Err(unavailable());
        }
        let mut matches = self.inner.query_by_vector(collection, embedding, limit).await?;
        if self.hide_scores {
            for hit in &mut matches {
                hit.score = None;
            }
        }
        Ok(matches)
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list {
            return Err(unavailable());
        }
        self.inner.list_all(collection).await
    }
}

/// Store `documents` with vocabulary embeddings.
pub async fn seed(index: &dyn VectorIndex, documents: &[Document]) {
    index.create_collection(COLLECTION, dimensions()).await.unwrap();
    for doc in documents {
        let doc = doc.clone().with_embedding(vocabulary_embedding(&doc.content));
        index.insert(COLLECTION, &doc).await.unwrap();
    }
}

pub fn config() -> RetrieverConfig {
    RetrieverConfig::builder().collection(COLLECTION).dimensions(dimensions()).build().unwrap()
}

pub fn retriever(
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
) -> HybridRetriever {
    HybridRetriever::new(config(), embedder, index).unwrap()
}

/// Nine documents sharing no words with the FD tenure query.
pub fn unrelated_documents() -> Vec<Document> {
    [
        "Unlisted shares settle within two working days after payment",
        "Listed bonds pay coupons on a fixed schedule",
        "Complete KYC once to invest across products",
        "Your demat account must be active before you buy shares",
        "Bond prices move inversely to market yields",
        "Transfers from a savings account need UPI or netbanking",
        "Capital gains on unlisted shares attract tax",
        "Contact support from your app for order issues",
        "Corporate bonds carry credit ratings from agencies",
    ]
    .iter()
    .enumerate()
    .map(|(i, text)| Document::new(format!("other-{i}"), *text))
    .collect()
}

/// A language model that returns a fixed reply and records prompts.
pub struct ScriptedModel {
    pub reply: String,
    pub prompts: std::sync::Mutex<Vec<String>>,
    pub delay: Option<Duration>,
    pub fail: bool,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self { reply: reply.to_string(), prompts: Default::default(), delay: None, fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::replying("") }
    }

    pub fn stalling(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::replying("late answer") }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RagError::ModelError {
                provider: "scripted".into(),
                message: "rate limited".into(),
            });
        }
        Ok(self.reply.clone())
    }
}
