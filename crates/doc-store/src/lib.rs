//! Document store for the marketplace backend.
//!
//! Documents are JSON objects grouped into collections and keyed by
//! [`DocumentId`]. Writes are last-writer-wins; the only conditional write is
//! [`DocumentStore::adjust_counter`], which keeps a counter between zero and a
//! caller-supplied ceiling.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::DocumentId;
pub use document::Document;
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{DocumentQuery, SortOrder, json_contains};
pub use store::{DocumentStore, DocumentStoreExt};
