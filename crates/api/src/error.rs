//! API error types with HTTP response mapping.

use analytics::AnalyticsError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError, OrderError};
use payments::PaymentError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Authenticated, but not allowed.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Payment provider error.
    Payment(PaymentError),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

impl ApiError {
    /// The status code and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Domain(err) => domain_status(err),
            ApiError::Payment(err) => payment_status(err),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            let detail = match &self {
                ApiError::Domain(err) => err.to_string(),
                ApiError::Payment(err) => err.to_string(),
                ApiError::Internal(msg) => msg.clone(),
                _ => message.clone(),
            };
            tracing::error!(error = %detail, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_status(err: &DomainError) -> (StatusCode, String) {
    let status = match err {
        DomainError::Validation(_)
        | DomainError::Conflict(_)
        | DomainError::InvalidCredentials
        | DomainError::Product(_) => StatusCode::BAD_REQUEST,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound { .. }
        | DomainError::Cart(CartError::LineNotFound { .. })
        | DomainError::Order(OrderError::ProductNotFound { .. }) => StatusCode::NOT_FOUND,
        DomainError::Cart(_) | DomainError::Order(_) => StatusCode::BAD_REQUEST,
        DomainError::Store(_) | DomainError::Serialization(_) | DomainError::PasswordHash(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string());
        }
    };

    let message = match err {
        DomainError::InvalidCredentials => "Invalid password".to_string(),
        other => other.to_string(),
    };
    (status, message)
}

fn payment_status(err: &PaymentError) -> (StatusCode, String) {
    match err {
        PaymentError::AmountTooSmall { .. }
        | PaymentError::InvalidSignature(_)
        | PaymentError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        PaymentError::IntentNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PaymentError::Api(_) | PaymentError::Request(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Payment provider request failed".to_string(),
        ),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Domain(err) => ApiError::Domain(err),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}
