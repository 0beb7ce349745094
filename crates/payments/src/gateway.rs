//! Payment gateway trait.

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// Smallest amount, in minor units, the provider accepts.
pub const MINIMUM_AMOUNT: i64 = 50;

/// Currency used when the client names none.
pub const DEFAULT_CURRENCY: &str = "inr";

/// A payment intent as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the browser to confirm the payment.
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
}

/// Trait for payment provider operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an intent to collect `amount` in `currency`.
    async fn create_intent(&self, amount: Money, currency: &str)
    -> Result<PaymentIntent, PaymentError>;

    /// Fetches the current state of an intent.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;
}

/// Rejects amounts below [`MINIMUM_AMOUNT`].
pub fn validate_amount(amount: Money) -> Result<(), PaymentError> {
    if amount.cents() < MINIMUM_AMOUNT {
        return Err(PaymentError::AmountTooSmall {
            amount: amount.cents(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_amount_is_inclusive() {
        assert!(validate_amount(Money::from_cents(50)).is_ok());
        assert!(matches!(
            validate_amount(Money::from_cents(49)),
            Err(PaymentError::AmountTooSmall { amount: 49 })
        ));
        assert!(validate_amount(Money::zero()).is_err());
    }
}
