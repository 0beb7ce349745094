//! Bearer-token authentication.
//!
//! Tokens are HS256 JSON Web Tokens whose `sub` claim is the user id. Every
//! authenticated request reloads the user, so deleted accounts lose access
//! immediately.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use doc_store::DocumentStore;
use domain::{User, UserId};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// How long an issued token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 30;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Token verification failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token is not three dot-separated parts")]
    Malformed,
    #[error("unsupported token header")]
    UnsupportedHeader,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),
    #[error("token expired")]
    Expired,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: UserId,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Creates a signer with the default 30-day lifetime.
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            ttl: Duration::days(TOKEN_TTL_DAYS),
        }
    }

    /// Overrides the token lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issues a token for `user`.
    pub fn issue(&self, user: UserId) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    fn issue_at(&self, user: UserId, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        let claims =
            serde_json::to_vec(&claims).map_err(|e| AuthError::InvalidClaims(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&signing_input)?);
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Checks the signature and expiry of `token` and returns its subject.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<UserId, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed);
        };

        let header: Header = URL_SAFE_NO_PAD
            .decode(header)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(AuthError::UnsupportedHeader)?;
        if header.alg != "HS256" {
            return Err(AuthError::UnsupportedHeader);
        }

        let expected = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::BadSignature)?;
        let mut mac = self.mac()?;
        mac.update(token[..token.len() - signature.len() - 1].as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| AuthError::BadSignature)?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|e| AuthError::InvalidClaims(e.to_string()))
            .and_then(|bytes| {
                serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidClaims(e.to_string()))
            })?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }

        Ok(claims.sub)
    }

    fn sign(&self, input: &str) -> Result<Vec<u8>, AuthError> {
        let mut mac = self.mac()?;
        mac.update(input.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))
    }
}

/// Extracts the bearer token from request headers.
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("Bearer"))
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token provided".to_string()))?;

    let token = value["Bearer".len()..].trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized(
            "Not authorized, invalid token format".to_string(),
        ));
    }
    Ok(token)
}

/// Extractor that requires a valid bearer token for an existing user.
///
/// ```rust,ignore
/// async fn handler(AuthUser(user): AuthUser) -> String {
///     user.username
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthUser
where
    S: DocumentStore + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let user_id = state.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Not authorized, invalid token".to_string())
        })?;

        let user = state.users.get(user_id).await?.ok_or_else(|| {
            tracing::info!(%user_id, "Token for a missing user");
            ApiError::Unauthorized("User not found or account deleted".to_string())
        })?;

        Ok(Self(user))
    }
}

/// Extractor that additionally requires the merchant role.
#[derive(Debug, Clone)]
pub struct MerchantUser(pub User);

impl<S> FromRequestParts<Arc<AppState<S>>> for MerchantUser
where
    S: DocumentStore + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_merchant() {
            return Err(ApiError::Forbidden(
                "Access denied. Merchant role required.".to_string(),
            ));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(SecretString::from("test-signing-secret".to_string()))
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let user = UserId::new();
        let token = signer.issue(user).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(signer.verify(&token).unwrap(), user);
    }

    #[test]
    fn test_expires_after_ttl() {
        let signer = signer();
        let user = UserId::new();
        let issued = 1_700_000_000;
        let token = signer.issue_at(user, issued).unwrap();

        let just_before = issued + TOKEN_TTL_DAYS * 86_400 - 1;
        assert_eq!(signer.verify_at(&token, just_before).unwrap(), user);
        assert_eq!(
            signer.verify_at(&token, just_before + 1),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn test_custom_ttl() {
        let signer = signer().with_ttl(Duration::minutes(5));
        let user = UserId::new();
        let issued = 1_700_000_000;
        let token = signer.issue_at(user, issued).unwrap();

        assert_eq!(signer.verify_at(&token, issued + 299).unwrap(), user);
        assert_eq!(
            signer.verify_at(&token, issued + 300),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = signer().issue(UserId::new()).unwrap();
        let other = TokenSigner::new(SecretString::from("another-secret".to_string()));
        assert_eq!(other.verify(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_rejects_tampered_claims() {
        let signer = signer();
        let token = signer.issue(UserId::new()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "sub": UserId::new(), "iat": 0, "exp": i64::MAX }).to_string(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert_eq!(signer.verify(&forged), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_rejects_malformed_and_unsigned() {
        let signer = signer();
        assert_eq!(signer.verify("abc"), Err(AuthError::Malformed));
        assert_eq!(signer.verify("a.b.c.d"), Err(AuthError::Malformed));

        let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let token = format!("{none_header}.e30.");
        assert_eq!(signer.verify(&token), Err(AuthError::UnsupportedHeader));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", signer());
        assert!(!debug.contains("test-signing-secret"));
    }
}
