//! HTTP API server for the marketplace.
//!
//! Provides REST endpoints for accounts, the catalogue, carts, checkout,
//! order management, merchant analytics and payments, with structured
//! logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod password;
pub mod routes;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use doc_store::DocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use auth::{AuthUser, MerchantUser, TokenSigner};
pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use password::Argon2Hasher;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    uploads_dir: impl AsRef<Path>,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api/shop", shop_routes::<S>())
        .nest("/api/users", user_routes::<S>())
        .nest("/api/cart", cart_routes::<S>())
        .nest("/api/orders", order_routes::<S>())
        .nest("/api/payments", payment_routes::<S>())
        .with_state(state)
        .merge(metrics_router)
        .nest_service("/uploads", ServeDir::new(uploads_dir.as_ref()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

fn shop_routes<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    use routes::products;

    Router::new()
        .route("/products", get(products::list::<S>))
        .route("/categories", get(products::categories::<S>))
        .route("/add-product", post(products::create::<S>))
        .route("/user-products", get(products::owned::<S>))
        .route(
            "/product/{id}",
            get(products::get::<S>)
                .put(products::update::<S>)
                .delete(products::delete::<S>),
        )
}

fn user_routes<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    use routes::users;

    Router::new()
        .route("/signup", post(users::signup::<S>))
        .route("/login", post(users::login::<S>))
        .route("/logout", post(users::logout))
        .route("/profile", get(users::profile).put(users::update_profile::<S>))
}

fn cart_routes<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    use routes::cart;

    Router::new()
        .route("/get-items", post(cart::items::<S>))
        .route("/add-item", post(cart::add_item::<S>))
        .route("/remove-item", post(cart::remove_item::<S>))
        .route("/update-quantity", post(cart::update_quantity::<S>))
        .route("/clear", post(cart::clear::<S>).delete(cart::clear::<S>))
}

fn order_routes<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    use routes::orders;

    Router::new()
        .route("/create", post(orders::checkout::<S>))
        .route("/checkout", post(orders::checkout::<S>))
        .route("/my-orders", get(orders::my_orders::<S>))
        .route("/merchant", get(orders::merchant_orders::<S>))
        .route("/merchant/sales", get(orders::merchant_sales::<S>))
        .route("/merchant/analytics", get(orders::merchant_analytics::<S>))
        .route("/merchant/{id}/status", put(orders::update_status::<S>))
        .route("/{id}/cancel", put(orders::cancel::<S>))
        .route("/{id}/payment-status", put(orders::payment_status::<S>))
}

fn payment_routes<S: DocumentStore + Clone + 'static>() -> Router<Arc<AppState<S>>> {
    use routes::payments;

    Router::new()
        .route("/create-payment-intent", post(payments::create_intent::<S>))
        .route("/confirm-payment", post(payments::confirm::<S>))
        .route("/webhook", post(payments::webhook::<S>))
}
