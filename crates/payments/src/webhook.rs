//! Stripe webhook signature verification.
//!
//! Stripe signs each delivery with a `Stripe-Signature` header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The HMAC-SHA256 is computed over
//! `"<t>.<raw body>"` with the endpoint's signing secret.

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, instrument};

use crate::error::PaymentError;

/// Maximum age of a signed delivery, in seconds.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// A payment outcome reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// `payment_intent.succeeded`
    Succeeded { intent_id: String },
    /// `payment_intent.payment_failed`
    Failed { intent_id: String },
    /// Any other event type; acknowledged and ignored.
    Other { event_type: String },
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Debug, Deserialize)]
struct StripeEventObject {
    id: Option<String>,
}

/// Verifies signed webhook deliveries and decodes them.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    /// Create a verifier for an endpoint signing secret.
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Override the accepted clock skew.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance_secs: u64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verify a delivery against the current time and decode its event.
    ///
    /// # Errors
    ///
    /// Returns error if the signature is invalid or the body is not an event.
    pub fn verify(&self, payload: &str, header: &str) -> Result<PaymentEvent, PaymentError> {
        self.verify_at(payload, header, Utc::now().timestamp())
    }

    /// Verify a delivery as of `now` (unix seconds).
    #[instrument(skip(self, payload, header))]
    pub fn verify_at(
        &self,
        payload: &str,
        header: &str,
        now: i64,
    ) -> Result<PaymentEvent, PaymentError> {
        let (timestamp, signatures) = parse_header(header)?;

        if now.abs_diff(timestamp) > self.tolerance_secs {
            return Err(PaymentError::InvalidSignature(
                "Timestamp outside the tolerance zone".to_string(),
            ));
        }

        let expected = self.compute_signature(timestamp, payload)?;
        if !signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            return Err(PaymentError::InvalidSignature(
                "No signatures found matching the expected signature".to_string(),
            ));
        }

        debug!("Webhook signature verified");
        decode_event(payload)
    }

    /// Build a `Stripe-Signature` header value for a payload.
    pub fn signature_header(&self, payload: &str, timestamp: i64) -> Result<String, PaymentError> {
        let signature = self.compute_signature(timestamp, payload)?;
        Ok(format!("t={timestamp},v1={signature}"))
    }

    fn compute_signature(&self, timestamp: i64, payload: &str) -> Result<String, PaymentError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Splits `t=...,v1=...` into the timestamp and every v1 signature.
fn parse_header(header: &str) -> Result<(i64, Vec<&str>), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    PaymentError::InvalidSignature("Invalid timestamp".to_string())
                })?);
            }
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::InvalidSignature("Unable to extract timestamp from header".to_string())
    })?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature(
            "No v1 signatures in header".to_string(),
        ));
    }

    Ok((timestamp, signatures))
}

fn decode_event(payload: &str) -> Result<PaymentEvent, PaymentError> {
    let event: StripeEvent = serde_json::from_str(payload)?;
    let intent_id = event.data.object.id;

    Ok(match (event.event_type.as_str(), intent_id) {
        ("payment_intent.succeeded", Some(intent_id)) => PaymentEvent::Succeeded { intent_id },
        ("payment_intent.payment_failed", Some(intent_id)) => PaymentEvent::Failed { intent_id },
        _ => PaymentEvent::Other {
            event_type: event.event_type,
        },
    })
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SecretString::from("whsec_test_secret".to_string()))
    }

    fn event(event_type: &str, id: &str) -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": event_type,
            "data": { "object": { "id": id, "object": "payment_intent" } }
        })
        .to_string()
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_valid_signature_decodes_event() {
        let v = verifier();
        let payload = event("payment_intent.succeeded", "pi_1");
        let header = v.signature_header(&payload, NOW).unwrap();

        let decoded = v.verify_at(&payload, &header, NOW + 10).unwrap();
        assert_eq!(
            decoded,
            PaymentEvent::Succeeded {
                intent_id: "pi_1".to_string()
            }
        );
    }

    #[test]
    fn test_failed_and_other_events() {
        let v = verifier();

        let failed = event("payment_intent.payment_failed", "pi_2");
        let header = v.signature_header(&failed, NOW).unwrap();
        assert_eq!(
            v.verify_at(&failed, &header, NOW).unwrap(),
            PaymentEvent::Failed {
                intent_id: "pi_2".to_string()
            }
        );

        let other = event("charge.refunded", "ch_1");
        let header = v.signature_header(&other, NOW).unwrap();
        assert_eq!(
            v.verify_at(&other, &header, NOW).unwrap(),
            PaymentEvent::Other {
                event_type: "charge.refunded".to_string()
            }
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let v = verifier();
        let payload = event("payment_intent.succeeded", "pi_1");
        let header = v.signature_header(&payload, NOW).unwrap();
        let tampered = event("payment_intent.succeeded", "pi_evil");

        assert!(matches!(
            v.verify_at(&tampered, &header, NOW),
            Err(PaymentError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = event("payment_intent.succeeded", "pi_1");
        let header = verifier().signature_header(&payload, NOW).unwrap();
        let other = WebhookVerifier::new(SecretString::from("whsec_other".to_string()));

        assert!(other.verify_at(&payload, &header, NOW).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let v = verifier();
        let payload = event("payment_intent.succeeded", "pi_1");
        let header = v.signature_header(&payload, NOW).unwrap();

        assert!(v.verify_at(&payload, &header, NOW + 301).is_err());
        assert!(v.verify_at(&payload, &header, NOW + 300).is_ok());
    }

    #[test]
    fn test_custom_tolerance() {
        let v = verifier().with_tolerance(60);
        let payload = event("payment_intent.succeeded", "pi_1");
        let header = v.signature_header(&payload, NOW).unwrap();

        assert!(v.verify_at(&payload, &header, NOW - 60).is_ok());
        assert!(matches!(
            v.verify_at(&payload, &header, NOW + 61),
            Err(PaymentError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_extreme_timestamps_are_outside_tolerance() {
        let v = verifier();

        for header in [
            format!("t={},v1=00", i64::MIN),
            format!("t={},v1=00", i64::MAX),
        ] {
            let result = v.verify("{}", &header);
            match result {
                Err(PaymentError::InvalidSignature(msg)) => {
                    assert_eq!(msg, "Timestamp outside the tolerance zone");
                }
                other => panic!("expected a tolerance rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_any_matching_v1_is_accepted() {
        let v = verifier();
        let payload = event("payment_intent.succeeded", "pi_1");
        let good = v.signature_header(&payload, NOW).unwrap();
        let sig = good.split_once(",v1=").unwrap().1;
        let header = format!("t={NOW},v1=deadbeef,v1={sig}");

        assert!(v.verify_at(&payload, &header, NOW).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        let v = verifier();
        let payload = event("payment_intent.succeeded", "pi_1");

        let timestamp_only = format!("t={NOW}");
        for header in ["", "v1=abc", "t=notanumber,v1=abc", timestamp_only.as_str()] {
            assert!(
                matches!(
                    v.verify_at(&payload, header, NOW),
                    Err(PaymentError::InvalidSignature(_))
                ),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_signed_garbage_is_invalid_payload() {
        let v = verifier();
        let header = v.signature_header("not json", NOW).unwrap();

        assert!(matches!(
            v.verify_at("not json", &header, NOW),
            Err(PaymentError::InvalidPayload(_))
        ));
    }
}
