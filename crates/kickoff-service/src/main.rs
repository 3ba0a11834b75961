//! Kickoff Service - HTTP API for game listings and payment reconciliation
//!
//! This is the main entry point for the kickoff service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kickoff_service::{create_router, AppState, ServiceConfig};
use kickoff_store::{MemoryStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kickoff=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kickoff Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_configured = %config.database_url.is_some(),
        stripe_webhook_verified = %config.stripe_webhook_secret.is_some(),
        count_mode = config.count_mode.as_str(),
        "Service configuration loaded"
    );

    let store = open_store(&config).await?;
    let state = AppState::new(store, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "postgres-backend")]
async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    let Some(url) = &config.database_url else {
        return Ok(memory_store());
    };

    tracing::info!("Connecting to PostgreSQL");
    let store = kickoff_store::PgStore::connect(url, config.database_max_connections).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres-backend"))]
async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL set but the postgres-backend feature is disabled");
    }
    Ok(memory_store())
}

fn memory_store() -> Arc<dyn Store> {
    tracing::warn!("Using in-memory store - data will not survive a restart");
    Arc::new(MemoryStore::new())
}
