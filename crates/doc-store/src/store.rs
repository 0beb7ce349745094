use async_trait::async_trait;

use crate::{Document, DocumentId, DocumentQuery, Result, StoreError};

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Apart from
/// [`adjust_counter`](DocumentStore::adjust_counter), writes carry no
/// concurrency token: the last writer wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document.
    ///
    /// Fails with `Conflict` if a document with the same collection and ID
    /// exists, or if a unique index rejects the body.
    async fn insert(&self, document: Document) -> Result<()>;

    /// Retrieves a document by collection and ID.
    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>>;

    /// Replaces the body of an existing document.
    ///
    /// Returns the stored document with its refreshed `updated_at`.
    /// Fails with `NotFound` if the document does not exist.
    async fn replace(&self, document: Document) -> Result<Document>;

    /// Deletes a document. Returns false if nothing was deleted.
    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool>;

    /// Retrieves documents matching a query.
    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Counts documents matching a query (limit and offset are ignored).
    async fn count(&self, query: DocumentQuery) -> Result<u64>;

    /// Atomically adds `delta` to an integer field of a document body.
    ///
    /// Returns the new value, or `None` without writing when the result would
    /// fall outside `0..=max`. Fails with `NotFound` if the document does not
    /// exist.
    async fn adjust_counter(
        &self,
        collection: &str,
        id: DocumentId,
        field: &str,
        delta: i64,
        max: i64,
    ) -> Result<Option<i64>>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Returns the first document matching a query.
    async fn find_one(&self, query: DocumentQuery) -> Result<Option<Document>> {
        Ok(self.find(query.limit(1)).await?.into_iter().next())
    }

    /// Checks whether a document exists.
    async fn exists(&self, collection: &str, id: DocumentId) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Validates a document before it is written.
pub fn validate_document(document: &Document) -> Result<()> {
    if document.collection.is_empty() {
        return Err(StoreError::InvalidDocument(
            "Collection name cannot be empty".to_string(),
        ));
    }

    if !document.body.is_object() {
        return Err(StoreError::InvalidDocument(format!(
            "Body of {}/{} must be a JSON object",
            document.collection, document.id
        )));
    }

    Ok(())
}
