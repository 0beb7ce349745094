//! Stripe REST client.

use async_trait::async_trait;
use domain::Money;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::error::PaymentError;
use crate::gateway::{PaymentGateway, PaymentIntent, validate_amount};

/// Stripe API base URL.
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

/// Payment gateway backed by the Stripe API.
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    secret_key: SecretString,
    base_url: String,
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("secret_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StripeGateway {
    /// Create a client for the live Stripe API.
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self::with_base_url(secret_key, STRIPE_API_BASE)
    }

    /// Create a client against another base URL (a mock server, for instance).
    #[must_use]
    pub fn with_base_url(secret_key: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url: base_url.into(),
        }
    }

    async fn parse_intent(
        response: Response,
        intent_id: Option<&str>,
    ) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| PaymentError::Request(e.to_string()));
        }

        let body: Option<StripeErrorBody> = response.json().await.ok();
        let detail = body.map(|b| b.error);
        let message = detail
            .as_ref()
            .and_then(|d| d.message.clone())
            .unwrap_or_else(|| format!("HTTP {status}"));

        let missing = status == StatusCode::NOT_FOUND
            || detail
                .as_ref()
                .and_then(|d| d.code.as_deref())
                .is_some_and(|code| code == "resource_missing");
        if missing && let Some(id) = intent_id {
            return Err(PaymentError::IntentNotFound(id.to_string()));
        }

        error!(%status, %message, "Stripe API error");
        Err(PaymentError::Api(message))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self))]
    async fn create_intent(
        &self,
        amount: Money,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        validate_amount(amount)?;

        let params = [
            ("amount", amount.cents().to_string()),
            ("currency", currency.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let intent = Self::parse_intent(response, None).await?;
        debug!(intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .get(format!("{}/payment_intents/{intent_id}", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        Self::parse_intent(response, Some(intent_id)).await
    }
}
