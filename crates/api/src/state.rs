//! Shared application state.

use std::sync::Arc;

use analytics::AnalyticsService;
use doc_store::DocumentStore;
use domain::{CartService, OrderService, PasswordHasher, ProductService, UserService};
use payments::{DEFAULT_CURRENCY, PaymentGateway, WebhookVerifier};

use crate::auth::TokenSigner;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub users: UserService<S>,
    pub products: ProductService<S>,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub analytics: AnalyticsService<S>,
    pub payments: Arc<dyn PaymentGateway>,
    /// Absent when no webhook signing secret is configured.
    pub webhooks: Option<WebhookVerifier>,
    pub tokens: TokenSigner,
    pub currency: String,
}

impl<S: DocumentStore + Clone + 'static> AppState<S> {
    /// Wires every service to `store`.
    pub fn new(
        store: S,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenSigner,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            users: UserService::new(store.clone(), hasher),
            products: ProductService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            analytics: AnalyticsService::new(store),
            payments,
            webhooks: None,
            tokens,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Enables the webhook route.
    #[must_use]
    pub fn with_webhooks(mut self, verifier: WebhookVerifier) -> Self {
        self.webhooks = Some(verifier);
        self
    }

    /// Sets the currency used for new payment intents.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}
