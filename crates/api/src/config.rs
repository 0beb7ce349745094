//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string, or `memory` for the in-memory store
//! - `JWT_SECRET` - token signing secret (32+ characters recommended)
//! - `STRIPE_SECRET_KEY` - Stripe secret API key (`sk_...`)
//!
//! ## Optional
//! - `STRIPE_WEBHOOK_SECRET` - webhook endpoint signing secret; the webhook route
//!   rejects every delivery without it
//! - `HOST` - bind address (default: `0.0.0.0`)
//! - `PORT` - listen port (default: `5000`)
//! - `RUST_LOG` - tracing filter directive (default: `info`)
//! - `UPLOADS_DIR` - directory served under `/uploads` (default: `uploads`)
//! - `PAYMENT_CURRENCY` - currency for payment intents (default: `inr`)

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MEMORY_DATABASE_URL: &str = "memory";
const REQUIRED: [&str; 3] = ["DATABASE_URL", "JWT_SECRET", "STRIPE_SECRET_KEY"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: SecretString,
    pub jwt_secret: SecretString,
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: Option<SecretString>,
    pub uploads_dir: PathBuf,
    pub payment_currency: String,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming every missing required variable, or the first
    /// optional variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|key| get(key).is_none())
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars(missing));
        }

        let secret = |key: &str| SecretString::from(get(key).unwrap_or_default());

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string())
                })?,
            None => 5000,
        };

        let config = Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            database_url: secret("DATABASE_URL"),
            jwt_secret: secret("JWT_SECRET"),
            stripe_secret_key: secret("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: get("STRIPE_WEBHOOK_SECRET").map(SecretString::from),
            uploads_dir: get("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            payment_currency: get("PAYMENT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| payments::DEFAULT_CURRENCY.to_string()),
        };

        for warning in config.warnings() {
            tracing::warn!("{warning}");
        }

        Ok(config)
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when `DATABASE_URL` selects the in-memory store.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.expose_secret() == MEMORY_DATABASE_URL
    }

    /// Settings that work but look wrong.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LENGTH {
            warnings.push(format!(
                "JWT_SECRET is shorter than {MIN_JWT_SECRET_LENGTH} characters"
            ));
        }
        if !self.stripe_secret_key.expose_secret().starts_with("sk_") {
            warnings.push("STRIPE_SECRET_KEY does not look like a Stripe secret key".to_string());
        }
        if self.stripe_webhook_secret.is_none() {
            warnings.push("STRIPE_WEBHOOK_SECRET is not set, webhooks will be rejected".to_string());
        }
        warnings
    }
}
