//! Data types for documents, search results, and query responses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// The closed set of document categories stored in the knowledge base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Frequently asked question.
    #[default]
    #[serde(rename = "FAQ")]
    Faq,
    /// Standard operating procedure.
    #[serde(rename = "SOP")]
    Sop,
    /// Product help article.
    #[serde(rename = "HelpDoc")]
    HelpDoc,
}

impl DocumentType {
    /// The tag used at storage boundaries and in generation context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faq => "FAQ",
            Self::Sop => "SOP",
            Self::HelpDoc => "HelpDoc",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FAQ" => Ok(Self::Faq),
            "SOP" => Ok(Self::Sop),
            "HelpDoc" => Ok(Self::HelpDoc),
            other => Err(RagError::VectorStoreError {
                backend: "decode".to_string(),
                message: format!("unknown document type '{other}'"),
            }),
        }
    }
}

/// An immutable retrievable unit of the knowledge base.
///
/// The `embedding` is only populated at insertion time. Documents returned by
/// retrieval carry an empty embedding; it is skipped when serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier, stable across the vector store and the lexical cache.
    pub id: String,
    /// Display label, may be empty.
    #[serde(default)]
    pub title: String,
    /// Raw text used for lexical scoring and as generation context.
    pub content: String,
    /// Vector embedding of `content`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    /// Document category.
    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document {
    /// Create a document with an empty title, no tags, and no embedding.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: content.into(),
            embedding: Vec::new(),
            doc_type: DocumentType::default(),
            tags: Vec::new(),
        }
    }

    /// Set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the document category.
    pub fn with_type(mut self, doc_type: DocumentType) -> Self {
        self.doc_type = doc_type;
        self
    }

    /// Set the tags, preserving their order.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Return a copy of this document with the embedding dropped.
    pub fn without_embedding(&self) -> Self {
        Self { embedding: Vec::new(), ..self.clone() }
    }
}

/// A [`Document`] paired with a relevance score.
///
/// Scores are only comparable within the ranking pass that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved document.
    pub document: Document,
    /// Relevance score (higher is more relevant).
    pub score: f32,
}

/// The end-to-end response envelope produced by the query pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedQuery {
    /// The query used for retrieval (currently the input query unchanged).
    pub rewritten_query: String,
    /// The generated answer.
    pub answer: String,
    /// Confidence estimate in `[0, 1]`.
    pub confidence: f32,
    /// Documents passed to the generator, in retrieval order.
    pub sources: Vec<Document>,
}
