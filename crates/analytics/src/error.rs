//! Analytics error types.

use thiserror::Error;

/// Errors that can occur while building a read model.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Loading orders or products failed.
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
