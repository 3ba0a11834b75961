//! Game availability view.
//!
//! Combines a game's ticket capacity with its completed-attendee count.

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::game::GameSummary;

/// A game summary with remaining capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAvailability {
    /// The summary the figures were computed from.
    #[serde(flatten)]
    pub summary: GameSummary,

    /// `total_tickets - actualAttendees`. Negative when overbooked; never clamped.
    #[serde(rename = "spotsLeft")]
    pub spots_left: i64,

    /// Whether the completed count has reached capacity.
    #[serde(rename = "isFullyBooked")]
    pub is_fully_booked: bool,
}

impl GameAvailability {
    /// Spots left as shown to players: hidden once the game is fully booked.
    ///
    /// `spots_left` still carries the underlying number.
    #[must_use]
    pub fn display_spots_left(&self) -> Option<i64> {
        (!self.is_fully_booked).then_some(self.spots_left)
    }
}

/// Compute availability for a summary.
///
/// # Errors
///
/// Returns `CoreError::MissingField` when `total_tickets` is absent or the
/// attendee count is unknown. Neither is defaulted: a missing capacity read as
/// zero would mark the game fully booked.
pub fn with_availability(summary: GameSummary) -> Result<GameAvailability> {
    let total_tickets = summary
        .game
        .details
        .total_tickets
        .ok_or_else(|| missing(&summary, "total_tickets"))?;
    let attendees = i64::from(
        summary
            .actual_attendees
            .ok_or_else(|| missing(&summary, "actualAttendees"))?,
    );

    Ok(GameAvailability {
        spots_left: total_tickets.saturating_sub(attendees),
        is_fully_booked: attendees >= total_tickets,
        summary,
    })
}

fn missing(summary: &GameSummary, field: &'static str) -> CoreError {
    CoreError::MissingField {
        game_id: summary.id().to_string(),
        field,
    }
}
