//! Stripe webhook support.
//!
//! Kickoff never calls the Stripe API; it only receives webhook events. This
//! module verifies their signatures and types the objects it reads.

pub mod types;

pub use types::{Charge, CheckoutSession, WebhookEvent, WebhookEventData};

use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// Error type for Stripe webhook verification.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// The `stripe-signature` header could not be parsed.
    #[error("malformed signature header: {0}")]
    MalformedHeader(&'static str),

    /// No signature in the header matches the payload.
    #[error("invalid webhook signature")]
    InvalidSignature,
}

/// Verify a `stripe-signature` header against the raw request body.
///
/// The header has the form `t=timestamp,v1=signature[,v1=signature...]`; each
/// `v1` is the hex HMAC-SHA256 of `"{timestamp}.{payload}"`. Any matching
/// signature is accepted, so rolling secrets keep working.
///
/// # Errors
///
/// Returns `StripeError::MalformedHeader` if the timestamp or every signature
/// is missing, and `StripeError::InvalidSignature` if none match.
pub fn verify_signature(payload: &str, header: &str, secret: &str) -> Result<(), StripeError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", ts)) => timestamp = Some(ts),
            Some(("v1", sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(StripeError::MalformedHeader("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(StripeError::MalformedHeader("missing v1 signature"));
    }

    let expected = hmac_sha256_hex(secret, &format!("{timestamp}.{payload}"))
        .map_err(|_| StripeError::InvalidSignature)?;

    if signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature)
    }
}
