//! Stripe webhook handler.
//!
//! Reconciles attendee payment status from processor events. The store write
//! completes before the webhook is acknowledged, so the next listing read
//! already counts a confirmed payment.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use kickoff_core::{AttendeeId, PaymentOutcome, PaymentStatus};
use kickoff_store::StoreError;

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{verify_signature, Charge, CheckoutSession, WebhookEvent};

/// Conditional writes attempted before a reconciliation gives up.
const MAX_RECONCILE_ATTEMPTS: usize = 3;

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.config.stripe_webhook_secret {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

        verify_signature(&body, signature, secret).map_err(|e| {
            tracing::warn!(error = %e, "Invalid Stripe webhook signature");
            ApiError::BadRequest("Invalid webhook signature".into())
        })?;
    } else {
        tracing::warn!("Stripe webhook_secret not configured - skipping signature verification");
    }

    let event: WebhookEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received Stripe webhook"
    );

    let object = event.data.object;
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session = parse_object::<CheckoutSession>(object)?;
            if session.is_paid() {
                apply_session_outcome(&state, &session, PaymentOutcome::Confirmed).await?;
            } else {
                tracing::info!(
                    session_id = %session.id,
                    payment_status = ?session.payment_status,
                    "Checkout session not paid yet, skipping"
                );
            }
        }
        "checkout.session.async_payment_succeeded" => {
            let session = parse_object::<CheckoutSession>(object)?;
            apply_session_outcome(&state, &session, PaymentOutcome::Confirmed).await?;
        }
        "checkout.session.async_payment_failed" => {
            let session = parse_object::<CheckoutSession>(object)?;
            apply_session_outcome(&state, &session, PaymentOutcome::Failed).await?;
        }
        "checkout.session.expired" => {
            let session = parse_object::<CheckoutSession>(object)?;
            apply_session_outcome(&state, &session, PaymentOutcome::Cancelled).await?;
        }
        "charge.refunded" => {
            let charge = parse_object::<Charge>(object)?;
            if charge.refunded {
                let attendee = charge.attendee_reference().ok_or_else(|| {
                    ApiError::BadRequest(format!("Charge {} has no attendee_id", charge.id))
                })?;
                reconcile_payment(&state, attendee, PaymentOutcome::Cancelled, None).await?;
            } else {
                tracing::info!(charge_id = %charge.id, "Partial refund, booking kept");
            }
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

fn parse_object<T: serde::de::DeserializeOwned>(object: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(object).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn apply_session_outcome(
    state: &AppState,
    session: &CheckoutSession,
    outcome: PaymentOutcome,
) -> Result<(), ApiError> {
    let attendee = session.attendee_reference().ok_or_else(|| {
        ApiError::BadRequest(format!("Checkout session {} has no attendee_id", session.id))
    })?;

    reconcile_payment(state, attendee, outcome, Some(&session.id)).await?;
    Ok(())
}

/// Apply a payment outcome to an attendee and persist the new status.
///
/// Re-delivered events are harmless: applying the same outcome twice leaves
/// the status unchanged. An outcome that cannot apply to the current status
/// (confirming a cancelled booking) is logged and leaves the booking as is.
///
/// The write is conditional on the status that was read. When another event
/// moves the booking first, the attendee is read again and the outcome is
/// reapplied to the new status.
///
/// # Errors
///
/// - `ApiError::BadRequest` if `attendee` is not a valid attendee id.
/// - `ApiError::NotFound` if the attendee doesn't exist.
/// - `ApiError::Conflict` if the status kept changing across every attempt.
pub async fn reconcile_payment(
    state: &AppState,
    attendee: &str,
    outcome: PaymentOutcome,
    stripe_session_id: Option<&str>,
) -> Result<PaymentStatus, ApiError> {
    let attendee_id: AttendeeId = attendee
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid attendee_id: {attendee}")))?;

    for attempt in 1..=MAX_RECONCILE_ATTEMPTS {
        let current = state
            .store
            .get_attendee(&attendee_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Attendee not found: {attendee_id}")))?;

        let next = match current.payment_status.reconcile(outcome) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(
                    attendee_id = %attendee_id,
                    payment_status = %current.payment_status,
                    outcome = ?outcome,
                    error = %e,
                    "Ignoring payment outcome"
                );
                return Ok(current.payment_status);
            }
        };

        let session_unchanged = stripe_session_id.is_none()
            || stripe_session_id == current.stripe_session_id.as_deref();
        if next == current.payment_status && session_unchanged {
            tracing::info!(
                attendee_id = %attendee_id,
                payment_status = %next,
                "Payment status already up to date"
            );
            return Ok(next);
        }

        match state
            .store
            .update_payment_status(&attendee_id, &current.payment_status, &next, stripe_session_id)
            .await
        {
            Ok(updated) => {
                tracing::info!(
                    attendee_id = %attendee_id,
                    game_id = %updated.game_id,
                    from = %current.payment_status,
                    to = %updated.payment_status,
                    outcome = ?outcome,
                    "Attendee payment status reconciled"
                );
                return Ok(updated.payment_status);
            }
            Err(StoreError::Changed { .. }) => {
                tracing::debug!(
                    attendee_id = %attendee_id,
                    attempt,
                    "Payment status changed concurrently, re-reading"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Conflict(format!(
        "Attendee {attendee_id} kept changing during reconciliation"
    )))
}
