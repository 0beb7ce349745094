//! Payment intents and webhook verification.
//!
//! - [`PaymentGateway`] trait with [`StripeGateway`] and [`InMemoryPaymentGateway`]
//! - [`WebhookVerifier`] for signed `Stripe-Signature` webhook deliveries

pub mod error;
pub mod gateway;
pub mod memory;
pub mod stripe;
pub mod webhook;

pub use error::PaymentError;
pub use gateway::{DEFAULT_CURRENCY, MINIMUM_AMOUNT, PaymentGateway, PaymentIntent, validate_amount};
pub use memory::InMemoryPaymentGateway;
pub use stripe::StripeGateway;
pub use webhook::{PaymentEvent, WebhookVerifier};
