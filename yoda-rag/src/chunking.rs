//! Recursive text splitting for ingestion.
//!
//! [`RecursiveSplitter`] splits hierarchically by paragraphs, then sentences,
//! then words, and merges the pieces back into chunks of at most `chunk_size`
//! characters. Consecutive chunks share up to `chunk_overlap` characters of
//! trailing context. All lengths are counted in `char`s, so multi-byte text
//! such as `₹` is never cut in the middle of a code point.

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::error::Result;

/// Separators tried in order, coarsest first.
const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

/// A strategy for splitting raw text into retrieval-sized chunks.
pub trait TextSplitter: Send + Sync {
    /// Split `text` into chunks. Returns an empty `Vec` for empty text.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Splits text hierarchically: paragraphs → sentences → words → characters.
///
/// # Example
///
/// ```rust,ignore
/// use yoda_rag::RecursiveSplitter;
///
/// let splitter = RecursiveSplitter::new(1000, 200);
/// let chunks = splitter.split(&faq_text);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    /// Create a new `RecursiveSplitter`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - number of trailing characters repeated at the start of the next chunk
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Create a splitter from validated ingestion settings.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.chunk_size, config.chunk_overlap))
    }
}

impl TextSplitter for RecursiveSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() || self.chunk_size == 0 {
            return Vec::new();
        }
        split_and_merge(text, self.chunk_size, self.chunk_overlap, &SEPARATORS)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` by the first separator and merge the segments into chunks.
/// Segments that are still too long are split with the next separator.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, remaining)) = separators.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut window_len = 0;

    for segment in split_keeping_separator(text, separator) {
        let segment_len = char_len(segment);

        if segment_len > chunk_size {
            if !window.is_empty() {
                chunks.push(join(&window));
                window.clear();
                window_len = 0;
            }
            chunks.extend(split_and_merge(segment, chunk_size, chunk_overlap, remaining));
            continue;
        }

        if window_len + segment_len > chunk_size && !window.is_empty() {
            chunks.push(join(&window));
            // Keep a tail of at most `chunk_overlap` chars that still leaves room.
            while window_len > chunk_overlap
                || (window_len + segment_len > chunk_size && !window.is_empty())
            {
                if let Some((_, len)) = window.pop_front() {
                    window_len -= len;
                }
            }
        }

        window.push_back((segment, segment_len));
        window_len += segment_len;
    }

    if !window.is_empty() {
        chunks.push(join(&window));
    }

    chunks
}

fn join(window: &VecDeque<(&str, usize)>) -> String {
    window.iter().map(|(segment, _)| *segment).collect()
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Fixed windows of `chunk_size` chars, advancing by `chunk_size - chunk_overlap`.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}
