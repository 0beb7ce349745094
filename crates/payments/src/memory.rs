//! In-memory payment gateway for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::Money;
use tokio::sync::RwLock;

use crate::error::PaymentError;
use crate::gateway::{PaymentGateway, PaymentIntent, validate_amount};

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    intents: HashMap<String, PaymentIntent>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory payment gateway with deterministic intent ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline intent creation.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Overrides the status of an intent, as the provider would after payment.
    pub async fn set_status(&self, intent_id: &str, status: &str) {
        if let Some(intent) = self.state.write().await.intents.get_mut(intent_id) {
            intent.status = status.to_string();
        }
    }

    /// Returns the number of intents created.
    pub async fn intent_count(&self) -> usize {
        self.state.read().await.intents.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_intent(
        &self,
        amount: Money,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        validate_amount(amount)?;
        let mut state = self.state.write().await;

        if state.fail_on_create {
            return Err(PaymentError::Api("Payment declined".to_string()));
        }

        state.next_id += 1;
        let id = format!("pi_test_{:04}", state.next_id);
        let intent = PaymentIntent {
            client_secret: Some(format!("{id}_secret")),
            id: id.clone(),
            status: "requires_payment_method".to_string(),
            amount: amount.cents(),
            currency: currency.to_string(),
        };
        state.intents.insert(id, intent.clone());

        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.state
            .read()
            .await
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentError::IntentNotFound(intent_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_retrieve() {
        let gateway = InMemoryPaymentGateway::new();

        let intent = gateway
            .create_intent(Money::from_cents(5000), "inr")
            .await
            .unwrap();
        assert_eq!(intent.id, "pi_test_0001");
        assert_eq!(intent.client_secret.as_deref(), Some("pi_test_0001_secret"));

        gateway.set_status(&intent.id, "succeeded").await;
        let fetched = gateway.retrieve_intent(&intent.id).await.unwrap();
        assert_eq!(fetched.status, "succeeded");
        assert_eq!(fetched.amount, 5000);
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_create(true).await;

        let result = gateway.create_intent(Money::from_cents(5000), "inr").await;
        assert!(matches!(result, Err(PaymentError::Api(_))));
        assert_eq!(gateway.intent_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejects_small_amount_and_unknown_intent() {
        let gateway = InMemoryPaymentGateway::new();

        assert!(matches!(
            gateway.create_intent(Money::from_cents(10), "inr").await,
            Err(PaymentError::AmountTooSmall { .. })
        ));
        assert!(matches!(
            gateway.retrieve_intent("pi_missing").await,
            Err(PaymentError::IntentNotFound(_))
        ));
    }
}
