//! Typed access to document collections.

use std::marker::PhantomData;

use common::DocumentId;
use doc_store::{Document, DocumentQuery, DocumentStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DomainError;

/// An entity persisted as one document in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the entity lives in.
    const COLLECTION: &'static str;

    /// Human-readable name used in not-found errors.
    const NAME: &'static str;

    /// Document key of this entity.
    fn document_id(&self) -> DocumentId;
}

/// Loads and stores entities of one type.
pub struct Repository<S, T>
where
    S: DocumentStore,
    T: Entity,
{
    store: S,
    _phantom: PhantomData<T>,
}

impl<S, T> Clone for Repository<S, T>
where
    S: DocumentStore + Clone,
    T: Entity,
{
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<S, T> Repository<S, T>
where
    S: DocumentStore,
    T: Entity,
{
    /// Creates a new repository backed by the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// A query over this entity's collection.
    pub fn query(&self) -> DocumentQuery {
        DocumentQuery::new(T::COLLECTION)
    }

    /// Loads an entity, returning None if it doesn't exist.
    pub async fn get(&self, id: impl Into<DocumentId>) -> Result<Option<T>, DomainError> {
        match self.store.get(T::COLLECTION, id.into()).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Loads an entity, failing with `NotFound` if it doesn't exist.
    pub async fn require(&self, id: impl Into<DocumentId>) -> Result<T, DomainError> {
        let id = id.into();
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(T::NAME, id))
    }

    /// Stores a new entity.
    pub async fn insert(&self, entity: &T) -> Result<(), DomainError> {
        let doc = Document::from_value(T::COLLECTION, entity.document_id(), entity)?;
        self.store.insert(doc).await?;
        Ok(())
    }

    /// Overwrites an existing entity.
    pub async fn save(&self, entity: &T) -> Result<(), DomainError> {
        let doc = Document::from_value(T::COLLECTION, entity.document_id(), entity)?;
        self.store.replace(doc).await?;
        Ok(())
    }

    /// Deletes an entity. Returns whether it existed.
    pub async fn delete(&self, id: impl Into<DocumentId>) -> Result<bool, DomainError> {
        Ok(self.store.delete(T::COLLECTION, id.into()).await?)
    }

    /// Runs a query and decodes every match.
    pub async fn find(&self, query: DocumentQuery) -> Result<Vec<T>, DomainError> {
        let docs = self.store.find(query).await?;
        docs.iter()
            .map(|doc| doc.decode().map_err(DomainError::from))
            .collect()
    }

    /// All entities whose body contains `filter`, oldest first.
    pub async fn find_where(&self, filter: Value) -> Result<Vec<T>, DomainError> {
        self.find(self.query().filter(filter)).await
    }

    /// First entity whose body contains `filter`.
    pub async fn find_one_where(&self, filter: Value) -> Result<Option<T>, DomainError> {
        let mut found = self.find(self.query().filter(filter).limit(1)).await?;
        Ok(found.pop())
    }

    /// Number of entities whose body contains `filter`.
    pub async fn count_where(&self, filter: Value) -> Result<u64, DomainError> {
        Ok(self.store.count(self.query().filter(filter)).await?)
    }

    /// Atomically adds `delta` to an integer field of an entity.
    ///
    /// Returns the new value, or None when it would leave `0..=max`.
    pub async fn adjust_counter(
        &self,
        id: impl Into<DocumentId>,
        field: &str,
        delta: i64,
        max: i64,
    ) -> Result<Option<i64>, DomainError> {
        Ok(self
            .store
            .adjust_counter(T::COLLECTION, id.into(), field, delta, max)
            .await?)
    }
}
