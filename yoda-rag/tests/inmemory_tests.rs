//! Property tests for in-memory vector index query ordering and tag fidelity.

use std::collections::HashMap;

use proptest::prelude::*;
use yoda_rag::inmemory::InMemoryVectorStore;
use yoda_rag::vectorstore::VectorIndex;
use yoda_rag::{Document, DocumentType};

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a document with a normalized embedding and up to three tags.
fn arb_document(dim: usize) -> impl Strategy<Value = Document> {
    (
        "[a-z]{3,8}",
        "[a-z ]{5,30}",
        proptest::collection::vec("[a-z]{2,6}", 0..4),
        arb_normalized_embedding(dim),
    )
        .prop_map(|(id, content, tags, embedding)| {
            Document::new(id, content)
                .with_type(DocumentType::Faq)
                .with_tags(tags)
                .with_embedding(embedding)
        })
}

/// Query results are ordered by descending similarity, bounded by `limit`,
/// and never carry embeddings.
mod prop_inmemory_query_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_limit(
            documents in proptest::collection::vec(arb_document(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            limit in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();

                let mut unique: HashMap<String, Document> = HashMap::new();
                for doc in &documents {
                    unique.insert(doc.id.clone(), doc.clone());
                    store.insert("test", doc).await.unwrap();
                }

                let results = store.query_by_vector("test", &query, limit).await.unwrap();
                (results, unique.len())
            });

            prop_assert!(results.len() <= limit);
            prop_assert_eq!(results.len(), limit.min(unique_count));

            for window in results.windows(2) {
                let (a, b) = (window[0].score.unwrap(), window[1].score.unwrap());
                prop_assert!(a >= b, "results not in descending order: {} < {}", a, b);
            }
            prop_assert!(results.iter().all(|hit| hit.document.embedding.is_empty()));
        }

        #[test]
        fn tags_round_trip_in_order(
            documents in proptest::collection::vec(arb_document(DIM), 1..10),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let listed = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();
                for doc in &documents {
                    store.insert("test", doc).await.unwrap();
                }
                store.list_all("test").await.unwrap()
            });

            // Later inserts with the same id replace earlier ones.
            let mut expected: HashMap<&str, &Document> = HashMap::new();
            for doc in &documents {
                expected.insert(doc.id.as_str(), doc);
            }
            prop_assert_eq!(listed.len(), expected.len());
            for doc in &listed {
                prop_assert_eq!(&doc.tags, &expected[doc.id.as_str()].tags);
            }
        }
    }
}

#[tokio::test]
async fn nse_faq_tags_round_trip() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", 2).await.unwrap();

    let tagged = Document::new("a", "NSE listing FAQ")
        .with_tags(["nse", "faqs"])
        .with_embedding(vec![1.0, 0.0]);
    let untagged = Document::new("b", "no tags here").with_embedding(vec![0.0, 1.0]);
    store.insert("docs", &tagged).await.unwrap();
    store.insert("docs", &untagged).await.unwrap();

    let listed = store.list_all("docs").await.unwrap();
    assert_eq!(listed[0].tags, vec!["nse", "faqs"]);
    assert!(listed[1].tags.is_empty());

    let hits = store.query_by_vector("docs", &[1.0, 0.0], 1).await.unwrap();
    assert_eq!(hits[0].document.tags, vec!["nse", "faqs"]);
}
