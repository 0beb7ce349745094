//! Tests for the Stripe client against a local stand-in for the REST API.

use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use domain::Money;
use payments::{PaymentError, PaymentGateway, StripeGateway};
use secrecy::SecretString;
use serde_json::{Value, json};

const KEY: &str = "sk_test_local";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {KEY}"))
}

async fn create_intent(
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Invalid API Key provided" } })),
        );
    }
    if form.get("automatic_payment_methods[enabled]").map(String::as_str) != Some("true") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": "missing automatic_payment_methods" } })),
        );
    }

    let amount: i64 = form["amount"].parse().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "id": "pi_local_1",
            "object": "payment_intent",
            "amount": amount,
            "currency": form["currency"],
            "client_secret": "pi_local_1_secret_abc",
            "status": "requires_payment_method"
        })),
    )
}

async fn retrieve_intent(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id != "pi_local_1" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": { "code": "resource_missing", "message": "No such payment_intent" }
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": id,
            "amount": 5000,
            "currency": "inr",
            "client_secret": null,
            "status": "succeeded"
        })),
    )
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/v1/payment_intents", post(create_intent))
        .route("/v1/payment_intents/{id}", get(retrieve_intent));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/v1")
}

#[tokio::test]
async fn creates_intent_with_form_encoded_body() {
    let base = spawn_stub().await;
    let gateway = StripeGateway::with_base_url(SecretString::from(KEY.to_string()), base);

    let intent = gateway
        .create_intent(Money::from_cents(5000), "inr")
        .await
        .unwrap();

    assert_eq!(intent.id, "pi_local_1");
    assert_eq!(intent.amount, 5000);
    assert_eq!(intent.currency, "inr");
    assert_eq!(intent.client_secret.as_deref(), Some("pi_local_1_secret_abc"));
}

#[tokio::test]
async fn retrieves_intent_and_maps_missing() {
    let base = spawn_stub().await;
    let gateway = StripeGateway::with_base_url(SecretString::from(KEY.to_string()), base);

    let intent = gateway.retrieve_intent("pi_local_1").await.unwrap();
    assert_eq!(intent.status, "succeeded");

    assert!(matches!(
        gateway.retrieve_intent("pi_nope").await,
        Err(PaymentError::IntentNotFound(id)) if id == "pi_nope"
    ));
}

#[tokio::test]
async fn provider_errors_carry_the_message() {
    let base = spawn_stub().await;
    let gateway =
        StripeGateway::with_base_url(SecretString::from("sk_test_wrong".to_string()), base);

    let result = gateway.create_intent(Money::from_cents(5000), "inr").await;

    assert!(matches!(
        result,
        Err(PaymentError::Api(message)) if message == "Invalid API Key provided"
    ));
}
