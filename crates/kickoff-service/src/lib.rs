//! Kickoff HTTP API Service.
//!
//! This crate provides the HTTP API for kickoff, including:
//!
//! - Upcoming game listings with attendee counts and availability
//! - Per-group listings and game detail
//! - The Stripe webhook that reconciles attendee payment status
//!
//! The store and configuration are built once in `main` and injected through
//! [`AppState`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Webhook handlers need async for consistency

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{verify_signature, StripeError};
