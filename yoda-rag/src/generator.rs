//! Answer generation from retrieved context.
//!
//! A [`LanguageModel`] is the narrow text-in/text-out boundary to a completion
//! service. [`LlmAnswerGenerator`] formats retrieved documents into a bounded
//! context block, fills the prompt template, and calls the model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{RagError, Result};

/// The prompt sent to the language model. `{context}` and `{query}` are replaced.
pub const RESPONSE_PROMPT_TEMPLATE: &str = "\
You are a helpful AI assistant for a financial services platform, specializing in Unlisted Shares, Fixed Deposits (FDs) and Listed Bonds.
Use ONLY the information provided in the context below to answer the question.
If numbers or specific details are mentioned in the context, use them exactly as stated.
Context information is below:
---------------------
{context}
---------------------
Given this context, provide a clear and accurate response to the following query. If the context doesn't contain enough information to answer confidently, say so.
Query: {query}
Answer:";

/// A single-turn prompt completion service.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier used in logs.
    fn name(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Produces an answer for a query from a set of context documents.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer to `query` using `documents` as context.
    async fn generate(&self, query: &str, documents: &[Document]) -> Result<String>;
}

/// Join document contents in order, separated by blank lines, and cut the
/// result to at most `char_budget` characters.
///
/// With `include_type_prefix` each entry reads `[FAQ] content`.
pub fn build_context(
    documents: &[Document],
    char_budget: usize,
    include_type_prefix: bool,
) -> String {
    let joined = documents
        .iter()
        .map(|doc| {
            if include_type_prefix {
                format!("[{}] {}", doc.doc_type, doc.content)
            } else {
                doc.content.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    match joined.char_indices().nth(char_budget) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

/// Fill [`RESPONSE_PROMPT_TEMPLATE`] with the context and query.
///
/// Only placeholders in the template itself are substituted; braces inside
/// the context or the query are copied verbatim.
pub fn render_prompt(context: &str, query: &str) -> String {
    RESPONSE_PROMPT_TEMPLATE
        .split("{context}")
        .map(|part| part.replace("{query}", query))
        .collect::<Vec<_>>()
        .join(context)
}

/// An [`AnswerGenerator`] that prompts a [`LanguageModel`].
pub struct LlmAnswerGenerator {
    model: Arc<dyn LanguageModel>,
    char_budget: usize,
    include_type_prefix: bool,
}

impl LlmAnswerGenerator {
    /// Create a generator with a 4000-character context budget and type prefixes.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model, char_budget: 4000, include_type_prefix: true }
    }

    /// Set the context budget in characters.
    pub fn with_char_budget(mut self, budget: usize) -> Self {
        self.char_budget = budget;
        self
    }

    /// Enable or disable `[TYPE]` prefixes in the context.
    pub fn with_type_prefix(mut self, include: bool) -> Self {
        self.include_type_prefix = include;
        self
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, query: &str, documents: &[Document]) -> Result<String> {
        let context = build_context(documents, self.char_budget, self.include_type_prefix);
        let prompt = render_prompt(&context, query);
        debug!(
            model = self.model.name(),
            context_chars = context.chars().count(),
            documents = documents.len(),
            "generating answer"
        );

        let answer = self.model.complete(&prompt).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            warn!(model = self.model.name(), "model returned an empty answer");
            return Err(RagError::GenerationFailed {
                message: format!("model '{}' returned an empty answer", self.model.name()),
                sources: Vec::new(),
            });
        }
        Ok(answer.to_string())
    }
}
