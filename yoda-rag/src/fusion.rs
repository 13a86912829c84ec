//! Reciprocal rank fusion of ranked result lists.
//!
//! Each list contributes `1 / (rank + k)` for a document at 0-based `rank`.
//! A document's fused score is the sum of its contributions across lists.
//! Rank-based fusion needs no calibration between the dense similarity and
//! BM25 scales, and an empty list simply contributes nothing.

use std::collections::HashMap;

use crate::document::SearchResult;

/// The RRF constant used unless configured otherwise.
pub const DEFAULT_RRF_K: u32 = 60;

/// Contribution of a document at 0-based `rank` in one list.
pub fn rrf_contribution(rank: usize, k: u32) -> f32 {
    1.0 / (rank as f32 + k as f32)
}

/// Fuse ranked lists into one ranking, highest fused score first.
///
/// Documents are identified by `document.id`. The first occurrence of an id
/// decides which [`Document`](crate::Document) value is kept and its position
/// in insertion order; lists are consumed in the order given. The sort is
/// stable, so among equal fused scores a document inserted earlier (for
/// example from the dense list) never ranks after one inserted later.
pub fn reciprocal_rank_fusion(lists: &[Vec<SearchResult>], k: u32) -> Vec<SearchResult> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut fused: Vec<SearchResult> = Vec::new();

    for list in lists {
        for (rank, result) in list.iter().enumerate() {
            let contribution = rrf_contribution(rank, k);
            match positions.get(&result.document.id) {
                Some(&index) => fused[index].score += contribution,
                None => {
                    positions.insert(result.document.id.clone(), fused.len());
                    fused.push(SearchResult {
                        document: result.document.clone(),
                        score: contribution,
                    });
                }
            }
        }
    }

    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn ranked(ids: &[&str]) -> Vec<SearchResult> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| SearchResult {
                document: Document::new(*id, ""),
                score: 10.0 - i as f32,
            })
            .collect()
    }

    fn score_of(results: &[SearchResult], id: &str) -> f32 {
        results.iter().find(|r| r.document.id == id).map(|r| r.score).unwrap()
    }

    #[test]
    fn shared_documents_sum_contributions() {
        let dense = ranked(&["a", "b", "c"]);
        let sparse = ranked(&["b", "a", "d"]);
        let fused = reciprocal_rank_fusion(&[dense, sparse], DEFAULT_RRF_K);

        assert_eq!(fused.len(), 4);
        assert_eq!(score_of(&fused, "a"), rrf_contribution(0, 60) + rrf_contribution(1, 60));
        assert_eq!(score_of(&fused, "b"), rrf_contribution(1, 60) + rrf_contribution(0, 60));
        assert_eq!(score_of(&fused, "c"), rrf_contribution(2, 60));
        assert_eq!(score_of(&fused, "d"), rrf_contribution(2, 60));

        let top: Vec<&str> = fused.iter().take(2).map(|r| r.document.id.as_str()).collect();
        assert!(top.contains(&"a") && top.contains(&"b"));
    }

    #[test]
    fn ties_keep_insertion_order() {
        // "a"/"b" tie, as do "c"/"d"; dense-first entries stay ahead.
        let fused =
            reciprocal_rank_fusion(&[ranked(&["a", "c"]), ranked(&["b", "d"])], DEFAULT_RRF_K);
        let ids: Vec<&str> = fused.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn first_occurrence_document_is_kept() {
        let dense = vec![SearchResult { document: Document::new("x", "dense copy"), score: 0.9 }];
        let sparse = vec![SearchResult {
            document: Document::new("x", "sparse copy").with_embedding(vec![1.0]),
            score: 3.0,
        }];
        let fused = reciprocal_rank_fusion(&[dense, sparse], DEFAULT_RRF_K);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].document.content, "dense copy");
    }

    #[test]
    fn empty_lists_fuse_to_nothing() {
        assert!(reciprocal_rank_fusion(&[vec![], vec![]], DEFAULT_RRF_K).is_empty());
        let only_sparse = reciprocal_rank_fusion(&[vec![], ranked(&["a"])], DEFAULT_RRF_K);
        assert_eq!(only_sparse[0].score, rrf_contribution(0, 60));
    }

    #[test]
    fn custom_k_changes_contributions() {
        let fused = reciprocal_rank_fusion(&[ranked(&["a"])], 1);
        assert_eq!(fused[0].score, 1.0);
    }
}
