use thiserror::Error;

use crate::DocumentId;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        collection: String,
        id: DocumentId,
    },

    /// A document with the same key, or violating a unique index, already exists.
    #[error("Document conflict in {collection}: {reason}")]
    Conflict { collection: String, reason: String },

    /// A counter adjustment targeted a field that does not hold an integer.
    #[error("Field '{field}' of {collection}/{id} is not an integer")]
    NotACounter {
        collection: String,
        id: DocumentId,
        field: String,
    },

    /// The document failed validation before being written.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
