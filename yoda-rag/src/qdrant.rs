//! Qdrant vector index backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorIndex`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! Qdrant only accepts UUIDs or integers as point ids, so each document id is
//! mapped to a UUID v5 and the original id is kept in the payload. Tags are
//! stored as a native list so they round-trip unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use yoda_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334")?;
//! store.create_collection("yoda_documents", 3072).await?;
//! store.insert("yoda_documents", &document).await?;
//! let hits = store.query_by_vector("yoda_documents", &query_embedding, 10).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId, PointStruct, PointsIdsList,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::document::{Document, DocumentType};
use crate::embedding::check_dimensions;
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorIndex, VectorMatch};

const BACKEND: &str = "qdrant";
const SCROLL_PAGE_SIZE: u32 = 256;

/// A [`VectorIndex`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections use cosine distance; Qdrant's similarity is reported as the
/// native score of each [`VectorMatch`].
pub struct QdrantVectorStore {
    client: Qdrant,
    dimensions: RwLock<HashMap<String, usize>>,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self::from_client(client))
    }

    /// Create a new Qdrant vector store with an API key.
    pub fn with_api_key(url: &str, api_key: impl Into<String>) -> Result<Self> {
        let client =
            Qdrant::from_url(url).api_key(api_key.into()).build().map_err(Self::map_err)?;
        Ok(Self::from_client(client))
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client, dimensions: RwLock::new(HashMap::new()) }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::StoreUnavailable { backend: BACKEND.to_string(), message: e.to_string() }
    }

    fn decode_err(message: impl Into<String>) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.into() }
    }

    fn point_id(document_id: &str) -> PointId {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, document_id.as_bytes()).to_string().into()
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_string_list(value: &QdrantValue) -> Option<Vec<String>> {
        match &value.kind {
            Some(Kind::ListValue(list)) => {
                Some(list.values.iter().filter_map(Self::extract_string).collect())
            }
            _ => None,
        }
    }

    fn to_payload(document: &Document) -> Result<Payload> {
        let value = json!({
            "doc_id": document.id,
            "title": document.title,
            "content": document.content,
            "type": document.doc_type.as_str(),
            "tags": document.tags,
        });
        Payload::try_from(value).map_err(|e| Self::decode_err(format!("invalid payload: {e}")))
    }

    fn from_payload(payload: &HashMap<String, QdrantValue>) -> Result<Document> {
        let field = |name: &str| payload.get(name).and_then(Self::extract_string);

        let id = field("doc_id").ok_or_else(|| Self::decode_err("point payload has no doc_id"))?;
        let content = field("content")
            .ok_or_else(|| Self::decode_err(format!("point '{id}' has no content")))?;
        let doc_type = match field("type") {
            Some(raw) => raw.parse::<DocumentType>()?,
            None => DocumentType::default(),
        };
        let tags = payload.get("tags").and_then(Self::extract_string_list).unwrap_or_default();

        Ok(Document {
            id,
            title: field("title").unwrap_or_default(),
            content,
            embedding: Vec::new(),
            doc_type,
            tags,
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.dimensions.write().await.insert(name.to_string(), dimensions);

        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        let exists = collections.collections.iter().any(|c| c.name == name);
        if exists {
            debug!(collection = name, "qdrant collection already exists, attaching");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        self.dimensions.write().await.remove(name);
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn insert(&self, collection: &str, document: &Document) -> Result<()> {
        let expected = self.dimensions.read().await.get(collection).copied();
        // Unknown collections are validated server-side; only reject empty vectors here.
        check_dimensions(&document.embedding, expected.unwrap_or(document.embedding.len()))?;

        let point = PointStruct::new(
            Self::point_id(&document.id),
            document.embedding.clone(),
            Self::to_payload(document)?,
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, document.id = %document.id, "inserted document into qdrant");
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.iter().map(|id| Self::point_id(id)).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = ids.len(), "deleted points from qdrant");
        Ok(())
    }

    async fn query_by_vector(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorMatch>> {
        if let Some(&expected) = self.dimensions.read().await.get(collection) {
            check_dimensions(embedding, expected)?;
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        response
            .result
            .iter()
            .map(|scored| {
                Ok(VectorMatch {
                    document: Self::from_payload(&scored.payload)?,
                    score: Some(scored.score),
                })
            })
            .collect()
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut request = ScrollPointsBuilder::new(collection)
                .limit(SCROLL_PAGE_SIZE)
                .with_payload(true)
                .with_vectors(false);
            if let Some(next) = offset.take() {
                request = request.offset(next);
            }

            let page = self.client.scroll(request).await.map_err(Self::map_err)?;
            for point in &page.result {
                documents.push(Self::from_payload(&point.payload)?);
            }

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(collection, count = documents.len(), "listed qdrant documents");
        Ok(documents)
    }
}
