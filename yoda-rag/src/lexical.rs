//! BM25-style lexical scoring.
//!
//! [`score`] is a pure per-document scorer: tokens are lower-cased and split
//! on whitespace runs, with no stemming or stop-word removal. The inverse
//! document frequency is the constant `1.0` because no collection statistics
//! are available to a single call.
//!
//! [`LexicalCorpus`] pre-tokenizes a document set so the hybrid retriever can
//! score every cached document per query without re-tokenizing, and tracks
//! the corpus-average document length for callers that opt into
//! [`LengthNormalization::CorpusAverage`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::{Document, SearchResult};

const IDF: f64 = 1.0;

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length-normalization strength in `[0, 1]`.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Which average document length feeds the BM25 length-normalization term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthNormalization {
    /// Use the scored document's own length, which makes the term neutral.
    #[default]
    DocumentLength,
    /// Use the mean length of all documents in the corpus.
    CorpusAverage,
}

/// Lower-case `text` and split it on whitespace runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Score `document` against `query`.
///
/// The document's own length is used as the average length, so the
/// normalization term reduces to `1`. Use [`score_with_avg_len`] to supply a
/// corpus average instead.
pub fn score(query: &str, document: &str, params: &Bm25Params) -> f64 {
    score_with_avg_len(query, document, params, None)
}

/// Score `document` against `query` using an explicit average document length.
///
/// `None` falls back to the document's own length.
pub fn score_with_avg_len(
    query: &str,
    document: &str,
    params: &Bm25Params,
    avg_doc_len: Option<f64>,
) -> f64 {
    let terms = TermStats::from_text(document);
    terms.score(&tokenize(query), params, avg_doc_len)
}

/// Term frequencies and length of one tokenized document.
#[derive(Debug, Clone, Default)]
struct TermStats {
    freqs: HashMap<String, usize>,
    len: usize,
}

impl TermStats {
    fn from_text(text: &str) -> Self {
        let tokens = tokenize(text);
        let mut freqs = HashMap::new();
        for token in &tokens {
            *freqs.entry(token.clone()).or_insert(0) += 1;
        }
        Self { freqs, len: tokens.len() }
    }

    /// Repeated query terms contribute once per occurrence.
    fn score(&self, query_terms: &[String], params: &Bm25Params, avg_doc_len: Option<f64>) -> f64 {
        let doc_len = self.len as f64;
        let avg_len = avg_doc_len.filter(|avg| *avg > 0.0).unwrap_or(doc_len);

        let mut total = 0.0;
        for term in query_terms {
            let tf = match self.freqs.get(term) {
                Some(&tf) if tf > 0 => tf as f64,
                _ => continue,
            };
            let norm = if avg_len > 0.0 { doc_len / avg_len } else { 1.0 };
            let numerator = tf * (params.k1 + 1.0);
            let denominator = tf + params.k1 * (1.0 - params.b + params.b * norm);
            total += IDF * numerator / denominator;
        }
        total
    }
}

/// A pre-tokenized, read-only snapshot of documents for lexical ranking.
#[derive(Debug, Clone, Default)]
pub struct LexicalCorpus {
    documents: Vec<Document>,
    stats: Vec<TermStats>,
    avg_doc_len: f64,
}

impl LexicalCorpus {
    /// Tokenize `documents` into a corpus. Embeddings are dropped.
    pub fn new(documents: Vec<Document>) -> Self {
        let documents: Vec<Document> =
            documents.into_iter().map(|doc| Document { embedding: Vec::new(), ..doc }).collect();
        let stats: Vec<TermStats> =
            documents.iter().map(|doc| TermStats::from_text(&doc.content)).collect();
        let total_len: usize = stats.iter().map(|s| s.len).sum();
        let avg_doc_len =
            if stats.is_empty() { 0.0 } else { total_len as f64 / stats.len() as f64 };
        Self { documents, stats, avg_doc_len }
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Mean token count across the corpus (`0.0` when empty).
    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    /// The cached documents in load order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Score every document and return the best `limit`, highest first.
    ///
    /// Equal scores keep corpus order. Documents with no matching term are
    /// still ranked (score `0.0`) so that the result length depends only on
    /// `limit` and the corpus size.
    pub fn rank(
        &self,
        query: &str,
        params: &Bm25Params,
        normalization: LengthNormalization,
        limit: usize,
    ) -> Vec<SearchResult> {
        let query_terms = tokenize(query);
        let avg = match normalization {
            LengthNormalization::DocumentLength => None,
            LengthNormalization::CorpusAverage => Some(self.avg_doc_len),
        };

        let mut scored: Vec<(usize, f32)> = self
            .stats
            .iter()
            .enumerate()
            .map(|(i, stats)| (i, stats.score(&query_terms, params, avg) as f32))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
            .into_iter()
            .map(|(i, score)| SearchResult { document: self.documents[i].clone(), score })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits_whitespace_runs() {
        assert_eq!(tokenize("  Minimum\tFD \n tenure "), vec!["minimum", "fd", "tenure"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn zero_when_no_term_matches() {
        let params = Bm25Params::default();
        assert_eq!(score("gold bonds", "minimum tenure is 12 months", &params), 0.0);
        assert_eq!(score("anything", "", &params), 0.0);
        assert_eq!(score("", "some text", &params), 0.0);
    }

    #[test]
    fn single_occurrence_scores_one_per_term_with_neutral_normalization() {
        // tf = 1, norm = 1: 1 * 2.5 / (1 + 1.5) = 1.0
        let params = Bm25Params::default();
        let s = score("minimum tenure", "The minimum tenure is 12 months", &params);
        assert!((s - 2.0).abs() < 1e-12);
    }

    #[test]
    fn term_frequency_saturates() {
        let params = Bm25Params::default();
        let once = score("fd", "fd", &params);
        let twice = score("fd", "fd fd", &params);
        let many = score("fd", &"fd ".repeat(50), &params);
        assert!(twice > once);
        assert!(many < params.k1 + 1.0);
    }

    #[test]
    fn matching_is_case_insensitive_but_not_stemmed() {
        let params = Bm25Params::default();
        assert!(score("DEPOSITS", "fixed deposits", &params) > 0.0);
        assert_eq!(score("deposit", "fixed deposits", &params), 0.0);
    }

    #[test]
    fn repeated_query_terms_count_each_time() {
        let params = Bm25Params::default();
        let single = score("fd", "fd rates", &params);
        let double = score("fd fd", "fd rates", &params);
        assert!((double - 2.0 * single).abs() < 1e-12);
    }

    #[test]
    fn corpus_average_penalizes_long_documents() {
        let params = Bm25Params::default();
        let short = score_with_avg_len("fd", "fd rates", &params, Some(10.0));
        let long_text = format!("fd {}", "x ".repeat(30));
        let long = score_with_avg_len("fd", &long_text, &params, Some(10.0));
        assert!(short > long);
    }

    #[test]
    fn corpus_rank_orders_and_truncates() {
        let corpus = LexicalCorpus::new(vec![
            Document::new("a", "unlisted shares lock in period"),
            Document::new("b", "fd tenure fd tenure"),
            Document::new("c", "fd interest"),
        ]);
        assert_eq!(corpus.len(), 3);
        assert!((corpus.avg_doc_len() - 11.0 / 3.0).abs() < 1e-12);

        let ranked =
            corpus.rank("fd tenure", &Bm25Params::default(), LengthNormalization::default(), 2);
        let ids: Vec<&str> = ranked.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn ranked_scores_stay_attached_to_their_documents() {
        let params = Bm25Params::default();
        let corpus = LexicalCorpus::new(vec![
            Document::new("kyc", "kyc documents for account opening"),
            Document::new("bonds", "listed bonds payout schedule"),
            Document::new("fd", "fd tenure is 12 months"),
        ]);
        let ranked = corpus.rank("fd tenure", &params, LengthNormalization::default(), 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].document.id, "fd");
        assert_eq!(ranked[0].document.content, "fd tenure is 12 months");
        assert_eq!(ranked[0].score, score("fd tenure", "fd tenure is 12 months", &params) as f32);
    }

    #[test]
    fn identical_content_scores_equal_and_keeps_both() {
        let corpus = LexicalCorpus::new(vec![
            Document::new("first", "minimum tenure"),
            Document::new("second", "minimum tenure"),
        ]);
        let ranked =
            corpus.rank("minimum", &Bm25Params::default(), LengthNormalization::default(), 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].document.id, "first");
        assert_eq!(ranked[1].document.id, "second");
    }

    #[test]
    fn empty_corpus_ranks_nothing() {
        let corpus = LexicalCorpus::default();
        assert!(corpus.is_empty());
        let params = Bm25Params::default();
        assert!(corpus.rank("fd", &params, LengthNormalization::CorpusAverage, 5).is_empty());
    }
}
