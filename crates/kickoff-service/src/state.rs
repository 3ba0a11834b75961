//! Application state.

use std::sync::Arc;

use kickoff_store::Store;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        if config.stripe_webhook_secret.is_some() {
            tracing::info!("Stripe webhook signature verification enabled");
        } else {
            tracing::warn!("Stripe webhook secret not configured - signatures will not be verified");
        }

        tracing::info!(count_mode = config.count_mode.as_str(), "Attendee count mode");

        Self { store, config }
    }
}
