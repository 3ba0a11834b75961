//! Stripe webhook types.
//!
//! Only the fields kickoff reads are modelled; everything else is ignored.

use serde::Deserialize;

/// Stripe webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: WebhookEventData,
}

/// Webhook event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// The event object.
    pub object: serde_json::Value,
}

/// Stripe Checkout session object.
///
/// Bookings set `metadata.attendee_id` (and `client_reference_id` as a
/// fallback) when the session is created.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    pub id: String,
    /// Payment status (`paid`, `unpaid`, `no_payment_required`).
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Client reference ID.
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl CheckoutSession {
    /// The attendee this session pays for.
    #[must_use]
    pub fn attendee_reference(&self) -> Option<&str> {
        metadata_attendee(&self.metadata).or(self.client_reference_id.as_deref())
    }

    /// Whether the funds were captured.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// Stripe charge object, as delivered with `charge.refunded`.
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    /// Charge ID.
    pub id: String,
    /// Whether the charge was refunded in full. Partial refunds leave this false.
    #[serde(default)]
    pub refunded: bool,
    /// Metadata copied from the payment intent.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Charge {
    /// The attendee this charge paid for.
    #[must_use]
    pub fn attendee_reference(&self) -> Option<&str> {
        metadata_attendee(&self.metadata)
    }
}

fn metadata_attendee(metadata: &serde_json::Value) -> Option<&str> {
    metadata
        .get("attendee_id")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_reads_type_and_object_only() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "id": "evt_1",
            "type": "checkout.session.expired",
            "livemode": false,
            "data": { "object": { "id": "cs_test_1" } }
        }))
        .unwrap();
        assert_eq!(event.event_type, "checkout.session.expired");
        assert_eq!(event.data.object["id"], "cs_test_1");
    }

    #[test]
    fn session_prefers_metadata_attendee() {
        let session: CheckoutSession = serde_json::from_value(json!({
            "id": "cs_test_1",
            "payment_status": "paid",
            "client_reference_id": "fallback",
            "metadata": { "attendee_id": "from-metadata" }
        }))
        .unwrap();
        assert!(session.is_paid());
        assert_eq!(session.attendee_reference(), Some("from-metadata"));
    }

    #[test]
    fn session_falls_back_to_client_reference() {
        let session: CheckoutSession = serde_json::from_value(json!({
            "id": "cs_test_2",
            "payment_status": "unpaid",
            "client_reference_id": "fallback"
        }))
        .unwrap();
        assert!(!session.is_paid());
        assert_eq!(session.attendee_reference(), Some("fallback"));
    }

    #[test]
    fn charge_without_metadata_has_no_attendee() {
        let charge: Charge = serde_json::from_value(json!({ "id": "ch_1" })).unwrap();
        assert_eq!(charge.attendee_reference(), None);
        assert!(!charge.refunded);
    }

    #[test]
    fn charge_reads_full_refund_flag() {
        let charge: Charge = serde_json::from_value(json!({
            "id": "ch_2",
            "refunded": true,
            "amount_refunded": 1000,
            "metadata": { "attendee_id": "a-1" }
        }))
        .unwrap();
        assert!(charge.refunded);
        assert_eq!(charge.attendee_reference(), Some("a-1"));
    }
}
