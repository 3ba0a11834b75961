//! Error types for kickoff.

use crate::attendee::{PaymentOutcome, PaymentStatus};
use crate::ids::IdError;

/// Result type for kickoff core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in kickoff core operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A join row has no usable game identifier.
    #[error("invalid row at index {index}: {reason}")]
    InvalidRow {
        /// Position of the row in the input sequence.
        index: usize,
        /// Why the row was rejected.
        reason: String,
    },

    /// A numeric or status field needed for a computation is absent.
    #[error("missing field `{field}` for game {game_id}")]
    MissingField {
        /// The game the field belongs to.
        game_id: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A payment outcome cannot be applied to the current status.
    #[error("invalid payment transition from {from} on {outcome:?}")]
    InvalidTransition {
        /// The status the attendee currently has.
        from: PaymentStatus,
        /// The outcome reported by the payment processor.
        outcome: PaymentOutcome,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
