//! Domain error types.

use doc_store::StoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::order::OrderError;
use crate::product::ProductError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Entity not found.
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The caller is not allowed to act on the entity.
    #[error("{0}")]
    Forbidden(String),

    /// A uniqueness rule would be violated.
    #[error("{0}")]
    Conflict(String),

    /// Wrong password for an existing account.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The password hasher failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// An error occurred in the product rules.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// An error occurred in the cart aggregate.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// An error occurred in the order aggregate.
    #[error(transparent)]
    Order(#[from] OrderError),
}

impl DomainError {
    /// Shorthand for a not-found error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
