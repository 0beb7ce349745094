use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Document, DocumentId, DocumentQuery, Result, SortOrder, StoreError,
    store::{DocumentStore, validate_document},
};

/// In-memory document store.
///
/// Keeps documents in insertion order and provides the same interface as the
/// PostgreSQL implementation. Used by tests and by the `memory` backend.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Removes every document.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }
}

fn position(documents: &[Document], collection: &str, id: DocumentId) -> Option<usize> {
    documents
        .iter()
        .position(|d| d.id == id && d.collection == collection)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<()> {
        validate_document(&document)?;

        let mut documents = self.documents.write().await;
        if position(&documents, &document.collection, document.id).is_some() {
            return Err(StoreError::Conflict {
                collection: document.collection,
                reason: format!("document {} already exists", document.id),
            });
        }

        documents.push(document);
        Ok(())
    }

    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(position(&documents, collection, id).map(|i| documents[i].clone()))
    }

    async fn replace(&self, mut document: Document) -> Result<Document> {
        validate_document(&document)?;

        let mut documents = self.documents.write().await;
        let Some(index) = position(&documents, &document.collection, document.id) else {
            return Err(StoreError::NotFound {
                collection: document.collection,
                id: document.id,
            });
        };

        let existing = &mut documents[index];
        document.created_at = existing.created_at;
        document.updated_at = Utc::now();
        *existing = document.clone();
        Ok(document)
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool> {
        let mut documents = self.documents.write().await;
        match position(&documents, collection, id) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut found: Vec<_> = documents
            .iter()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();

        // Stable sort keeps insertion order between equal timestamps
        match query.order {
            SortOrder::Oldest => found.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::Newest => {
                found.reverse();
                found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }

        let offset = query.offset.unwrap_or(0);
        let found = found.into_iter().skip(offset);
        let found = match query.limit {
            Some(limit) => found.take(limit).collect(),
            None => found.collect(),
        };

        Ok(found)
    }

    async fn count(&self, query: DocumentQuery) -> Result<u64> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| query.matches(d)).count() as u64)
    }

    async fn adjust_counter(
        &self,
        collection: &str,
        id: DocumentId,
        field: &str,
        delta: i64,
        max: i64,
    ) -> Result<Option<i64>> {
        let mut documents = self.documents.write().await;
        let Some(index) = position(&documents, collection, id) else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        };

        let document = &mut documents[index];
        let current = document
            .int_field(field)
            .ok_or_else(|| StoreError::NotACounter {
                collection: collection.to_string(),
                id,
                field: field.to_string(),
            })?;

        let Some(updated) = current.checked_add(delta).filter(|v| (0..=max).contains(v)) else {
            return Ok(None);
        };

        document.body[field] = serde_json::Value::from(updated);
        document.updated_at = Utc::now();
        Ok(Some(updated))
    }
}
