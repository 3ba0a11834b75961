//! Common test utilities for kickoff integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestResponse, TestServer};
use chrono::{Days, Utc};

use kickoff_core::{Attendee, Game, GameDetails, GroupId, PaymentStatus};
use kickoff_service::crypto::hmac_sha256_hex;
use kickoff_service::{create_router, AppState, ServiceConfig};
use kickoff_store::{MemoryStore, Store};

/// Webhook secret used by harnesses that verify signatures.
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server, for seeding and inspection.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a harness that does not verify webhook signatures.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    /// Create a harness that verifies webhook signatures with [`WEBHOOK_SECRET`].
    pub fn with_webhook_secret() -> Self {
        Self::with_config(ServiceConfig {
            stripe_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            ..ServiceConfig::default()
        })
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Seed a game `days_ahead` days from today (negative for past games).
    pub async fn seed_game(
        &self,
        name: &str,
        days_ahead: i64,
        total_tickets: Option<i64>,
        group_id: Option<GroupId>,
    ) -> Game {
        let today = Utc::now().date_naive();
        let offset = Days::new(days_ahead.unsigned_abs());
        let game_date = if days_ahead >= 0 {
            today.checked_add_days(offset)
        } else {
            today.checked_sub_days(offset)
        }
        .expect("date in range");

        let mut details = GameDetails::new(name, game_date);
        details.total_tickets = total_tickets;
        details.price = Some(10.0);
        details.group_id = group_id;

        let game = Game::new(details);
        self.store.put_game(&game).await.expect("Failed to seed game");
        game
    }

    /// Seed an attendee of `game` with the given status.
    pub async fn seed_attendee(&self, game: &Game, status: PaymentStatus) -> Attendee {
        let attendee = Attendee::pending(game.id, None).with_status(status);
        self.store
            .put_attendee(&attendee)
            .await
            .expect("Failed to seed attendee");
        attendee
    }

    /// Post a Stripe event, signed with [`WEBHOOK_SECRET`].
    pub async fn post_signed_webhook(&self, payload: &serde_json::Value) -> TestResponse {
        let body = payload.to_string();
        let timestamp = Utc::now().timestamp().to_string();
        let signature =
            hmac_sha256_hex(WEBHOOK_SECRET, &format!("{timestamp}.{body}")).expect("sign");

        self.server
            .post("/webhooks/stripe")
            .add_header(
                HeaderName::from_static("stripe-signature"),
                HeaderValue::from_str(&format!("t={timestamp},v1={signature}"))
                    .expect("header value"),
            )
            .text(body)
            .await
    }

    /// Post a Stripe event without a signature header.
    pub async fn post_webhook(&self, payload: &serde_json::Value) -> TestResponse {
        self.server
            .post("/webhooks/stripe")
            .text(payload.to_string())
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A Stripe checkout session event paying for `attendee_id`.
pub fn checkout_event(
    event_type: &str,
    attendee_id: &str,
    payment_status: &str,
) -> serde_json::Value {
    serde_json::json!({
        "id": "evt_test",
        "type": event_type,
        "data": {
            "object": {
                "id": "cs_test_123",
                "object": "checkout.session",
                "payment_status": payment_status,
                "metadata": { "attendee_id": attendee_id }
            }
        }
    })
}
