//! secret-santa server entry point.
//!
//! Starts the Axum HTTP server that stores the exchange and enforces
//! gift visibility.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use secret_santa::api;
use secret_santa::app_state::AppState;
use secret_santa::config::{ExchangeConfig, LogFormat};
use secret_santa::domain::PasscodeGate;
use secret_santa::service::ExchangeService;
use secret_santa::store::{ExchangeStore, MemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter()).init(),
    }

    // Load configuration
    let config = ExchangeConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(addr = %config.listen_addr, event = %config.event_name, "starting secret-santa");

    // Build store
    let store: Arc<dyn ExchangeStore> = if config.persistence_enabled {
        let pg = PostgresStore::connect(&config.database, &config.event_name)
            .await
            .context("connecting to PostgreSQL")?;
        tracing::info!("using PostgreSQL store");
        Arc::new(pg)
    } else {
        tracing::info!("using in-memory store; data is lost on restart");
        Arc::new(MemoryStore::new(&config.event_name))
    };

    // Build service layer
    let gate = PasscodeGate::new(&config.event_passcode).context("hashing event passcode")?;
    let exchange_service = Arc::new(ExchangeService::new(store, gate));
    let app_state = AppState { exchange_service };

    // Build router
    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
