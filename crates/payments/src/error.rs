//! Payment error types.

use thiserror::Error;

/// Errors that can occur while talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount below the provider minimum.
    #[error("Amount must be at least 50 minor units, got {amount}")]
    AmountTooSmall { amount: i64 },

    /// No intent with this id.
    #[error("Payment intent not found: {0}")]
    IntentNotFound(String),

    /// The provider refused the request.
    #[error("Payment provider error: {0}")]
    Api(String),

    /// The provider could not be reached or answered garbage.
    #[error("Payment request failed: {0}")]
    Request(String),

    /// The webhook signature header is missing, malformed, stale or wrong.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// The webhook body is not a valid event.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
