//! Integration tests for hybrid retrieval over the in-memory index.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use common::{
    COLLECTION, CountingIndex, FailingEmbedder, TruncatingEmbedder, VocabularyEmbedder, config,
    retriever, seed, unrelated_documents, vocabulary_embedding,
};
use futures::future::join_all;
use yoda_rag::{
    Bm25Params, Document, DocumentType, HybridRetriever, InMemoryVectorStore, LengthNormalization,
    LexicalCorpus, RagError, SearchBranch, VectorIndex,
};

fn fd_document() -> Document {
    Document::new("fd-tenure", "The minimum tenure for Fixed Deposits is 12 months")
        .with_title("FD FAQs")
        .with_type(DocumentType::Faq)
        .with_tags(["nse", "faqs"])
}

#[tokio::test]
async fn empty_store_returns_empty_results() {
    let retriever =
        retriever(Arc::new(VocabularyEmbedder::default()), Arc::new(InMemoryVectorStore::new()));

    let results = retriever.search("What is the minimum FD tenure?", 5).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(retriever.cached_len().await, Some(0));
}

#[tokio::test]
async fn relevant_document_ranks_in_top_three() {
    let index = Arc::new(InMemoryVectorStore::new());
    let mut documents = unrelated_documents();
    documents.insert(4, fd_document());
    seed(index.as_ref(), &documents).await;

    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index);
    let results = retriever.search("What is the minimum FD tenure?", 3).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().any(|doc| doc.id == "fd-tenure"), "got {results:?}");
    assert_eq!(results[0].id, "fd-tenure");
}

#[tokio::test]
async fn results_carry_metadata_without_embeddings() {
    let index = Arc::new(InMemoryVectorStore::new());
    seed(index.as_ref(), &[fd_document()]).await;

    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index);
    let results = retriever.search_default("minimum tenure").await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tags, vec!["nse".to_string(), "faqs".to_string()]);
    assert_eq!(results[0].title, "FD FAQs");
    assert_eq!(results[0].doc_type, DocumentType::Faq);
    assert!(results[0].embedding.is_empty());
}

#[tokio::test]
async fn limit_bounds_results_to_unique_ids() {
    let index = Arc::new(InMemoryVectorStore::new());
    let documents: Vec<Document> = (0..12)
        .map(|i| Document::new(format!("fund-{i}"), format!("fund option {i} with fund details")))
        .collect();
    seed(index.as_ref(), &documents).await;

    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index);
    let results = retriever.search("fund", 5).await.unwrap();

    assert_eq!(results.len(), 5);
    let ids: HashSet<&str> = results.iter().map(|doc| doc.id.as_str()).collect();
    assert_eq!(ids.len(), 5);
}

#[tokio::test]
async fn identical_content_under_different_ids_is_kept() {
    let index = Arc::new(InMemoryVectorStore::new());
    let text = "Interest payout happens every quarter";
    let twins = vec![Document::new("twin-a", text), Document::new("twin-b", text)];
    let mut documents = twins.clone();
    documents.extend(unrelated_documents());
    seed(index.as_ref(), &documents).await;

    let lexical = LexicalCorpus::new(documents).rank(
        "interest payout",
        &Bm25Params::default(),
        LengthNormalization::DocumentLength,
        4,
    );
    assert_eq!(lexical[0].document.id, "twin-a");
    assert_eq!(lexical[1].document.id, "twin-b");
    assert_eq!(lexical[0].score, lexical[1].score);

    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index);
    let ids: Vec<String> =
        retriever.search("interest payout", 5).await.unwrap().into_iter().map(|d| d.id).collect();
    assert!(ids.contains(&"twin-a".to_string()));
    assert!(ids.contains(&"twin-b".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_searches_initialize_once() {
    let index = Arc::new(CountingIndex {
        list_delay: Some(Duration::from_millis(50)),
        ..Default::default()
    });
    seed(index.as_ref(), &[fd_document()]).await;
    let seeded_creates = index.creates();

    let retriever = Arc::new(retriever(Arc::new(VocabularyEmbedder::default()), index.clone()));
    let searches = (0..8).map(|_| {
        let retriever = Arc::clone(&retriever);
        tokio::spawn(async move { retriever.search("minimum tenure", 3).await })
    });

    for outcome in join_all(searches).await {
        assert_eq!(outcome.unwrap().unwrap().len(), 1);
    }
    assert_eq!(index.lists(), 1);
    assert_eq!(index.creates() - seeded_creates, 1);

    retriever.initialize().await.unwrap();
    assert_eq!(index.lists(), 1);
}

#[tokio::test]
async fn refresh_picks_up_documents_inserted_after_initialization() {
    let index = Arc::new(CountingIndex::default());
    seed(index.as_ref(), &unrelated_documents()).await;

    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index.clone());
    assert!(!retriever.is_initialized().await);
    retriever.initialize().await.unwrap();
    assert_eq!(retriever.cached_len().await, Some(9));

    let late = fd_document().with_embedding(vocabulary_embedding(&fd_document().content));
    index.insert(COLLECTION, &late).await.unwrap();
    assert_eq!(retriever.cached_len().await, Some(9));

    assert_eq!(retriever.refresh().await.unwrap(), 10);
    assert_eq!(retriever.cached_len().await, Some(10));
    assert_eq!(index.lists(), 2);
}

#[tokio::test]
async fn position_scores_are_used_without_native_scores() {
    let index = Arc::new(CountingIndex { hide_scores: true, ..Default::default() });
    let mut documents = unrelated_documents();
    documents.push(fd_document());
    seed(index.as_ref(), &documents).await;

    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index);
    let results = retriever.search_scored("What is the minimum FD tenure?", 3).await.unwrap();

    assert_eq!(results[0].document.id, "fd-tenure");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn embedding_failure_is_reported_per_branch() {
    let index = Arc::new(InMemoryVectorStore::new());
    seed(index.as_ref(), &[fd_document()]).await;

    let failing = retriever(Arc::new(FailingEmbedder), index.clone());
    let err = failing.search("minimum tenure", 3).await.unwrap_err();
    assert!(matches!(
        err,
        RagError::SearchFailed { branch: SearchBranch::Embedding, ref source }
            if matches!(**source, RagError::EmbeddingError { .. })
    ));

    let truncating = retriever(Arc::new(TruncatingEmbedder), index);
    let err = truncating.search("minimum tenure", 3).await.unwrap_err();
    assert!(matches!(
        err,
        RagError::SearchFailed { branch: SearchBranch::Embedding, ref source }
            if matches!(**source, RagError::InvalidEmbedding { actual: 3, .. })
    ));
}

#[tokio::test]
async fn vector_query_failure_is_a_dense_branch_error() {
    let index = Arc::new(CountingIndex { fail_query: true, ..Default::default() });
    seed(index.as_ref(), &[fd_document()]).await;

    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index);
    let err = retriever.search("minimum tenure", 3).await.unwrap_err();
    assert!(matches!(err, RagError::SearchFailed { branch: SearchBranch::Dense, .. }));
}

#[tokio::test]
async fn unreachable_store_fails_initialization() {
    let index = Arc::new(CountingIndex { fail_list: true, ..Default::default() });
    let retriever = retriever(Arc::new(VocabularyEmbedder::default()), index);

    let err = retriever.initialize().await.unwrap_err();
    assert!(matches!(err, RagError::InitializationError(_)));
    assert!(!retriever.is_initialized().await);

    let err = retriever.search("minimum tenure", 3).await.unwrap_err();
    assert!(matches!(err, RagError::SearchFailed { branch: SearchBranch::Initialization, .. }));
}

#[tokio::test]
async fn blank_query_and_zero_limit_do_no_io() {
    let embedder = Arc::new(VocabularyEmbedder::default());
    let index = Arc::new(CountingIndex::default());
    let retriever = retriever(embedder.clone(), index.clone());

    assert!(matches!(retriever.search("   ", 5).await, Err(RagError::InvalidQuery(_))));
    assert!(retriever.search("tenure", 0).await.unwrap().is_empty());
    assert_eq!(embedder.calls(), 0);
    assert_eq!(index.lists(), 0);
}

#[test]
fn mismatched_embedder_dimensions_are_rejected() {
    let config = config();
    let wrong = yoda_rag::RetrieverConfig { dimensions: config.dimensions + 1, ..config };
    let err = HybridRetriever::new(
        wrong,
        Arc::new(VocabularyEmbedder::default()),
        Arc::new(InMemoryVectorStore::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, RagError::InvalidEmbedding { .. }));
}
