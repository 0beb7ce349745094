//! API server entry point.

use std::sync::Arc;

use api::{AppState, Argon2Hasher, Config, TokenSigner};
use doc_store::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
use metrics_exporter_prometheus::PrometheusHandle;
use payments::{StripeGateway, WebhookVerifier};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load .env, then configuration
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Pick the document store and serve
    if config.uses_memory_store() {
        tracing::warn!("using the in-memory document store, data is lost on restart");
        serve(config, InMemoryDocumentStore::new(), metrics_handle).await
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(config.database_url.expose_secret())
            .await?;
        let store = PostgresDocumentStore::new(pool);
        store.run_migrations().await?;
        tracing::info!("database migrations applied");
        serve(config, store, metrics_handle).await
    }
}

async fn serve<S: DocumentStore + Clone + 'static>(
    config: Config,
    store: S,
    metrics_handle: PrometheusHandle,
) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = StripeGateway::new(config.stripe_secret_key.clone());
    let mut state = AppState::new(
        store,
        Arc::new(Argon2Hasher),
        TokenSigner::new(config.jwt_secret.clone()),
        Arc::new(gateway),
    )
    .with_currency(config.payment_currency.clone());
    if let Some(secret) = config.stripe_webhook_secret.clone() {
        state = state.with_webhooks(WebhookVerifier::new(secret));
    }

    let app = api::create_app(Arc::new(state), metrics_handle, &config.uploads_dir);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}
