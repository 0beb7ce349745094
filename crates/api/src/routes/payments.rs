//! Payment intent and webhook endpoints under `/api/payments`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use doc_store::DocumentStore;
use domain::{Money, PaymentStatus};
use payments::{PaymentEvent, PaymentIntent, validate_amount};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";
const SUCCEEDED: &str = "succeeded";

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub status: String,
    pub payment_intent: PaymentIntent,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/payments/create-payment-intent
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id, amount = req.amount))]
pub async fn create_intent<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, ApiError> {
    let amount = Money::from_cents(req.amount);
    validate_amount(amount)?;

    let currency = req
        .currency
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.to_lowercase())
        .unwrap_or_else(|| state.currency.clone());

    let intent = state.payments.create_intent(amount, &currency).await?;
    tracing::info!(intent_id = %intent.id, %currency, "Payment intent created");

    Ok(Json(CreateIntentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    }))
}

/// POST /api/payments/confirm-payment
///
/// Reports the provider's view of the intent. A succeeded intent also marks
/// the orders carrying it as paid.
#[tracing::instrument(skip(state, _user, req), fields(intent_id = %req.payment_intent_id))]
pub async fn confirm<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(_user): AuthUser,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let intent = state
        .payments
        .retrieve_intent(&req.payment_intent_id)
        .await?;

    if intent.status == SUCCEEDED {
        state
            .orders
            .mark_payment_for_intent(&intent.id, PaymentStatus::Paid)
            .await?;
    }

    Ok(Json(ConfirmResponse {
        status: intent.status.clone(),
        payment_intent: intent,
    }))
}

/// POST /api/payments/webhook
///
/// Authenticated by the signature header instead of a bearer token. The body
/// is taken raw because the signature covers its exact bytes.
#[tracing::instrument(skip_all)]
pub async fn webhook<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>, ApiError> {
    let Some(verifier) = &state.webhooks else {
        tracing::warn!("Webhook received but no signing secret is configured");
        metrics::counter!("payment_webhooks_total", "outcome" => "unconfigured").increment(1);
        return Err(ApiError::BadRequest(
            "Webhook signing secret not configured".to_string(),
        ));
    };

    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let event = match verifier.verify(&body, header) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook verification failed");
            metrics::counter!("payment_webhooks_total", "outcome" => "rejected").increment(1);
            return Err(e.into());
        }
    };

    let (intent_id, payment_status) = match &event {
        PaymentEvent::Succeeded { intent_id } => (intent_id, PaymentStatus::Paid),
        PaymentEvent::Failed { intent_id } => (intent_id, PaymentStatus::Failed),
        PaymentEvent::Other { event_type } => {
            tracing::debug!(%event_type, "Unhandled webhook event");
            metrics::counter!("payment_webhooks_total", "outcome" => "ignored").increment(1);
            return Ok(Json(WebhookAck { received: true }));
        }
    };

    let updated = state
        .orders
        .mark_payment_for_intent(intent_id, payment_status)
        .await?;
    tracing::info!(%intent_id, %payment_status, orders = updated.len(), "Payment webhook applied");
    metrics::counter!("payment_webhooks_total", "outcome" => "applied").increment(1);

    Ok(Json(WebhookAck { received: true }))
}
