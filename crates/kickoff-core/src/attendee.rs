//! Attendee and payment status types for kickoff.
//!
//! An attendee row is created `pending` when a player starts a booking and is
//! only ever moved by payment reconciliation. [`PaymentStatus::reconcile`]
//! holds the transition rules.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{AttendeeId, GameId, PlayerId};

/// A booking record linking a player to a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// Attendee ID.
    pub id: AttendeeId,

    /// The game this booking is for.
    pub game_id: GameId,

    /// The player who booked, if known.
    #[serde(default)]
    pub player_id: Option<PlayerId>,

    /// Current payment status.
    pub payment_status: PaymentStatus,

    /// Stripe checkout session that paid for this booking.
    #[serde(default)]
    pub stripe_session_id: Option<String>,

    /// When the booking was created.
    pub created_at: DateTime<Utc>,

    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Attendee {
    /// Create a new pending booking.
    #[must_use]
    pub fn pending(game_id: GameId, player_id: Option<PlayerId>) -> Self {
        let now = Utc::now();
        Self {
            id: AttendeeId::generate(),
            game_id,
            player_id,
            payment_status: PaymentStatus::Pending,
            stripe_session_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the payment status (builder style, mostly for seeding).
    #[must_use]
    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = status;
        self
    }

    /// A nested attendee entry as it appears inside a join row.
    #[must_use]
    pub fn as_ref_entry(&self) -> AttendeeRef {
        AttendeeRef {
            id: Some(self.id),
            payment_status: Some(self.payment_status.clone()),
        }
    }
}

/// The attendee sub-record nested in a game join row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeRef {
    /// Attendee ID.
    #[serde(default)]
    pub id: Option<AttendeeId>,

    /// Payment status, absent if the row is malformed.
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

/// Payment status of a booking.
///
/// Serialized as the bare lowercase string the database stores. Statuses the
/// processor defines that kickoff does not model are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Booking started, payment not confirmed yet.
    Pending,

    /// The processor confirmed the funds transfer.
    Completed,

    /// The processor rejected the payment.
    Failed,

    /// The booking was cancelled, refunded or its checkout expired.
    Cancelled,

    /// Any other processor-defined state.
    Other(String),
}

impl PaymentStatus {
    /// Get the status as the string stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Whether this status counts towards a game's attendance.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Apply a payment outcome reported by the processor.
    ///
    /// Failed and cancelled outcomes always move a booking out of
    /// `completed`. A cancelled booking cannot be confirmed again.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` when confirming a cancelled booking.
    pub fn reconcile(&self, outcome: PaymentOutcome) -> Result<Self> {
        match (self, outcome) {
            (Self::Cancelled, PaymentOutcome::Confirmed) => Err(CoreError::InvalidTransition {
                from: self.clone(),
                outcome,
            }),
            (_, PaymentOutcome::Confirmed) => Ok(Self::Completed),
            (Self::Cancelled, PaymentOutcome::Failed) | (_, PaymentOutcome::Cancelled) => {
                Ok(Self::Cancelled)
            }
            (_, PaymentOutcome::Failed) => Ok(Self::Failed),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the payment processor reported about a booking's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Funds were captured.
    Confirmed,

    /// The payment attempt failed.
    Failed,

    /// The checkout expired or the charge was refunded.
    Cancelled,
}
