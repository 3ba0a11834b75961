//! Game types for kickoff.
//!
//! The store returns games as [`JoinRow`]s: the game columns joined with the
//! owning group, the organizer and the nested attendee entries. The aggregator
//! turns those rows into [`GameSummary`] values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attendee::{Attendee, AttendeeRef};
use crate::{GameId, GroupId, PlayerId};

/// The columns of a game, shared by join rows, games and summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetails {
    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,

    /// Scheduled date.
    pub game_date: NaiveDate,

    /// Scheduled kickoff time.
    #[serde(default)]
    pub game_time: Option<NaiveTime>,

    /// Where the game is played.
    #[serde(default)]
    pub location: Option<String>,

    /// Price per seat in currency units.
    #[serde(default)]
    pub price: Option<f64>,

    /// Ticket capacity.
    #[serde(default)]
    pub total_tickets: Option<i64>,

    /// Denormalized remaining count, maintained outside kickoff.
    #[serde(default)]
    pub available_tickets: Option<i64>,

    /// Length of the game in hours.
    #[serde(default)]
    pub duration_hours: Option<f64>,

    /// When the game was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// The organizing player.
    #[serde(default)]
    pub created_by: Option<PlayerId>,

    /// The owning group.
    #[serde(default)]
    pub group_id: Option<GroupId>,

    /// Owning group, joined.
    #[serde(default)]
    pub groups: Option<GroupInfo>,

    /// Organizer, joined.
    #[serde(default)]
    pub organizer: Option<Organizer>,
}

impl GameDetails {
    /// Create details for a game on the given date with everything else unset.
    #[must_use]
    pub fn new(name: impl Into<String>, game_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            description: None,
            game_date,
            game_time: None,
            location: None,
            price: None,
            total_tickets: None,
            available_tickets: None,
            duration_hours: None,
            created_at: None,
            created_by: None,
            group_id: None,
            groups: None,
            organizer: None,
        }
    }
}

/// Group fields joined onto a game row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Group name.
    pub name: String,

    /// Invite link of the group's `WhatsApp` chat.
    #[serde(default)]
    pub whatsapp_group: Option<String>,
}

/// Organizer fields joined onto a game row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    /// Player ID.
    pub id: PlayerId,

    /// Display name.
    pub name: String,

    /// Avatar URL.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// A scheduled game with a validated identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Game ID.
    pub id: GameId,

    /// Game columns.
    #[serde(flatten)]
    pub details: GameDetails,
}

impl Game {
    /// Create a game with a fresh identifier.
    #[must_use]
    pub fn new(details: GameDetails) -> Self {
        Self {
            id: GameId::generate(),
            details,
        }
    }

    /// Build the join row a store returns for this game and its attendees.
    ///
    /// Only attendees of this game are nested.
    #[must_use]
    pub fn to_join_row<'a>(&self, attendees: impl IntoIterator<Item = &'a Attendee>) -> JoinRow {
        let entries = attendees
            .into_iter()
            .filter(|a| a.game_id == self.id)
            .map(Attendee::as_ref_entry)
            .collect();

        JoinRow {
            id: Some(self.id.to_string()),
            details: self.details.clone(),
            game_attendees: Some(entries),
        }
    }
}

/// A flattened game row as produced by the store's join.
///
/// The identifier is kept as raw text so one malformed row cannot fail the
/// decoding of a whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRow {
    /// Raw game identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// Game columns.
    #[serde(flatten)]
    pub details: GameDetails,

    /// Nested attendee entries, absent when the join produced none.
    #[serde(default)]
    pub game_attendees: Option<Vec<AttendeeRef>>,
}

/// A game plus its completed-attendee count. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    /// The game.
    #[serde(flatten)]
    pub game: Game,

    /// Attendees whose payment completed; `None` when the count is unknown.
    #[serde(rename = "actualAttendees")]
    pub actual_attendees: Option<u32>,
}

impl GameSummary {
    /// Game ID.
    #[must_use]
    pub fn id(&self) -> GameId {
        self.game.id
    }
}
