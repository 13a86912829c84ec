//! Replaceable confidence scoring for generated answers.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::Document;

/// Phrases that signal the model was unsure of its answer.
const UNCERTAINTY_PHRASES: &[&str] = &[
    "don't have enough information",
    "do not have enough information",
    "not sure",
    "might be",
    "could be",
    "possibly",
    "i think",
    "unclear",
];

/// Numeric figures such as `12`, `7.5%`, or `₹500`.
static FIGURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"₹?\d+([.,]\d+)?%?").expect("figure pattern is valid"));

/// Estimates how much an answer can be trusted, in `[0, 1]`.
pub trait ConfidenceScorer: Send + Sync {
    /// Score `answer` given the documents it was generated from.
    fn score(&self, answer: &str, sources: &[Document]) -> f32;
}

/// Returns the same confidence for every answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfidence(pub f32);

impl Default for FixedConfidence {
    fn default() -> Self {
        Self(0.5)
    }
}

impl ConfidenceScorer for FixedConfidence {
    fn score(&self, _answer: &str, _sources: &[Document]) -> f32 {
        self.0.clamp(0.0, 1.0)
    }
}

/// Keyword and shape heuristics over the answer and its sources.
///
/// Starting from 0.5:
/// - −0.2 if the answer contains an uncertainty phrase
/// - +0.3 × min(sources / 5, 1)
/// - +0.2 if the answer has more than 20 and fewer than 200 words
/// - +0.3 if both the answer and some source contain a numeric figure
///
/// The result is clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicConfidence;

impl ConfidenceScorer for HeuristicConfidence {
    fn score(&self, answer: &str, sources: &[Document]) -> f32 {
        let mut confidence = 0.5_f32;

        let lowered = answer.to_lowercase();
        if UNCERTAINTY_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
            confidence -= 0.2;
        }

        if !sources.is_empty() {
            confidence += (sources.len() as f32 / 5.0).min(1.0) * 0.3;
        }

        let word_count = answer.split_whitespace().count();
        if word_count > 20 && word_count < 200 {
            confidence += 0.2;
        }

        if FIGURE.is_match(answer) && sources.iter().any(|doc| FIGURE.is_match(&doc.content)) {
            confidence += 0.3;
        }

        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(n: usize) -> Vec<Document> {
        (0..n).map(|i| Document::new(i.to_string(), "Minimum tenure is 12 months")).collect()
    }

    #[test]
    fn fixed_confidence_is_clamped() {
        assert_eq!(FixedConfidence::default().score("x", &[]), 0.5);
        assert_eq!(FixedConfidence(3.0).score("x", &[]), 1.0);
    }

    #[test]
    fn uncertain_answer_without_sources_scores_low() {
        let score = HeuristicConfidence.score("I am not sure.", &[]);
        assert!((score - 0.3).abs() < 1e-6);
    }

    #[test]
    fn grounded_numeric_answer_is_capped_at_one() {
        let answer = "The minimum tenure for Fixed Deposits is 12 months according to the \
                      product terms, and you can choose a longer tenure when you book the deposit.";
        assert!(answer.split_whitespace().count() > 20);
        assert_eq!(HeuristicConfidence.score(answer, &sources(5)), 1.0);
    }

    #[test]
    fn source_factor_scales_with_count() {
        let one = HeuristicConfidence.score("Yes.", &sources(1));
        let five = HeuristicConfidence.score("Yes.", &sources(5));
        let ten = HeuristicConfidence.score("Yes.", &sources(10));
        assert!((one - 0.56).abs() < 1e-6);
        assert!((five - 0.8).abs() < 1e-6);
        assert_eq!(five, ten);
    }

    #[test]
    fn figures_must_appear_on_both_sides() {
        let docs = vec![Document::new("a", "Open the app to invest")];
        let score = HeuristicConfidence.score("It takes 2 days.", &docs);
        assert!((score - 0.56).abs() < 1e-6);
    }
}
