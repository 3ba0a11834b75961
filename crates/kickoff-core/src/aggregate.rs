//! Attendance aggregation.
//!
//! Folds the store's join rows into one [`GameSummary`] per game, counting
//! the attendees whose payment completed. Output order is the order in which
//! game ids first appear in the input; the store's date ordering is preserved.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attendee::AttendeeRef;
use crate::error::CoreError;
use crate::game::{Game, GameSummary, JoinRow};
use crate::{GameId, GroupId};

/// How per-row attendee counts combine when a game spans several rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    /// Each row's completed count replaces the previous one; the last row wins.
    ///
    /// Exact when the store nests all of a game's attendees into one row.
    #[default]
    LastRow,

    /// Completed counts are summed across rows.
    ///
    /// Use with stores that yield one row per (game, attendee) pair.
    Accumulate,
}

impl CountMode {
    /// Get the mode name as used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LastRow => "last_row",
            Self::Accumulate => "accumulate",
        }
    }
}

impl FromStr for CountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_row" | "last-row" => Ok(Self::LastRow),
            "accumulate" => Ok(Self::Accumulate),
            other => Err(format!("unknown attendee count mode: {other}")),
        }
    }
}

/// Options for [`aggregate_with`].
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Keep only rows owned by this group. Applied before aggregation.
    pub group_id: Option<GroupId>,

    /// How counts from several rows of one game combine.
    pub count_mode: CountMode,
}

impl AggregateOptions {
    /// Restrict aggregation to one group.
    #[must_use]
    pub fn for_group(group_id: GroupId) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    /// Set the count mode.
    #[must_use]
    pub fn with_count_mode(mut self, count_mode: CountMode) -> Self {
        self.count_mode = count_mode;
        self
    }
}

/// A problem found in one input row. The row's data was skipped or degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// Position of the row in the input.
    pub index: usize,

    /// The affected game, when the row's id was usable.
    pub game_id: Option<GameId>,

    /// What went wrong.
    pub error: CoreError,
}

/// Result of an aggregation: the summaries plus the row errors for the caller to log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// One summary per distinct game, in first-seen order.
    pub summaries: Vec<GameSummary>,

    /// Rows that were skipped or whose count became unknown.
    pub errors: Vec<RowError>,
}

impl Aggregation {
    /// Whether every row was aggregated cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Aggregate join rows with default options.
#[must_use]
pub fn aggregate(rows: &[JoinRow]) -> Aggregation {
    aggregate_with(rows, &AggregateOptions::default())
}

/// Aggregate join rows into per-game summaries.
///
/// Rows without a usable game id are skipped and reported. A row whose
/// attendee collection holds an entry without a payment status makes that
/// game's count unknown (`None`) and is reported as a `MissingField` error.
#[must_use]
pub fn aggregate_with(rows: &[JoinRow], options: &AggregateOptions) -> Aggregation {
    let mut summaries: Vec<GameSummary> = Vec::new();
    let mut positions: HashMap<GameId, usize> = HashMap::new();
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if let Some(group_id) = options.group_id {
            if row.details.group_id != Some(group_id) {
                continue;
            }
        }

        let game_id = match row_game_id(index, row) {
            Ok(id) => id,
            Err(error) => {
                errors.push(RowError {
                    index,
                    game_id: None,
                    error,
                });
                continue;
            }
        };

        let position = *positions.entry(game_id).or_insert_with(|| {
            summaries.push(GameSummary {
                game: Game {
                    id: game_id,
                    details: row.details.clone(),
                },
                actual_attendees: Some(0),
            });
            summaries.len() - 1
        });

        let Some(entries) = row.game_attendees.as_deref() else {
            continue;
        };

        let row_count = match count_completed(entries) {
            Ok(count) => Some(count),
            Err(field) => {
                errors.push(RowError {
                    index,
                    game_id: Some(game_id),
                    error: CoreError::MissingField {
                        game_id: game_id.to_string(),
                        field,
                    },
                });
                None
            }
        };

        let summary = &mut summaries[position];
        summary.actual_attendees = match options.count_mode {
            CountMode::LastRow => row_count,
            CountMode::Accumulate => summary
                .actual_attendees
                .zip(row_count)
                .map(|(total, count)| total.saturating_add(count)),
        };
    }

    Aggregation { summaries, errors }
}

fn row_game_id(index: usize, row: &JoinRow) -> Result<GameId, CoreError> {
    let raw = row.id.as_deref().ok_or_else(|| CoreError::InvalidRow {
        index,
        reason: "missing game id".into(),
    })?;

    if raw.trim().is_empty() {
        return Err(CoreError::InvalidRow {
            index,
            reason: "blank game id".into(),
        });
    }

    raw.parse().map_err(|_| CoreError::InvalidRow {
        index,
        reason: format!("game id `{raw}` is not a UUID"),
    })
}

/// Count completed entries, or name the missing field.
fn count_completed(entries: &[AttendeeRef]) -> Result<u32, &'static str> {
    let mut count: u32 = 0;
    for entry in entries {
        let status = entry.payment_status.as_ref().ok_or("payment_status")?;
        if status.is_completed() {
            count = count.saturating_add(1);
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameDetails;
    use crate::PaymentStatus;
    use chrono::NaiveDate;

    fn details(group_id: Option<GroupId>) -> GameDetails {
        let mut details = GameDetails::new(
            "Weekly game",
            NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
        );
        details.total_tickets = Some(10);
        details.group_id = group_id;
        details
    }

    fn entry(status: &str) -> AttendeeRef {
        AttendeeRef {
            id: None,
            payment_status: Some(PaymentStatus::from(status.to_string())),
        }
    }

    fn row(id: GameId, statuses: Option<&[&str]>) -> JoinRow {
        JoinRow {
            id: Some(id.to_string()),
            details: details(None),
            game_attendees: statuses.map(|s| s.iter().map(|st| entry(st)).collect()),
        }
    }

    fn ids(aggregation: &Aggregation) -> Vec<GameId> {
        aggregation.summaries.iter().map(GameSummary::id).collect()
    }

    #[test]
    fn counts_completed_only() {
        let a = GameId::generate();
        let rows = [row(
            a,
            Some(&["completed", "pending", "completed", "cancelled"]),
        )];

        let result = aggregate(&rows);
        assert!(result.is_clean());
        assert_eq!(result.summaries.len(), 1);
        assert_eq!(result.summaries[0].actual_attendees, Some(2));
    }

    #[test]
    fn preserves_first_seen_order() {
        let (a, b, c) = (GameId::generate(), GameId::generate(), GameId::generate());
        let rows = [
            row(a, None),
            row(a, None),
            row(b, None),
            row(a, None),
            row(c, None),
        ];

        assert_eq!(ids(&aggregate(&rows)), vec![a, b, c]);
    }

    #[test]
    fn no_collection_counts_zero() {
        let a = GameId::generate();
        let result = aggregate(&[row(a, None)]);
        assert_eq!(result.summaries[0].actual_attendees, Some(0));
    }

    #[test]
    fn empty_collection_counts_zero() {
        let a = GameId::generate();
        let result = aggregate(&[row(a, Some(&[]))]);
        assert_eq!(result.summaries[0].actual_attendees, Some(0));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let (a, b) = (GameId::generate(), GameId::generate());
        let rows = [
            row(a, Some(&["completed"])),
            row(b, Some(&["pending", "completed", "completed"])),
            JoinRow {
                id: None,
                ..row(a, None)
            },
        ];

        assert_eq!(aggregate(&rows), aggregate(&rows));
    }

    #[test]
    fn last_row_wins_by_default() {
        let a = GameId::generate();
        let rows = [
            row(a, Some(&["completed", "completed"])),
            row(a, Some(&["completed"])),
        ];

        let result = aggregate(&rows);
        assert_eq!(result.summaries[0].actual_attendees, Some(1));
    }

    #[test]
    fn row_without_collection_keeps_previous_count() {
        let a = GameId::generate();
        let rows = [row(a, Some(&["completed", "completed"])), row(a, None)];

        let result = aggregate(&rows);
        assert_eq!(result.summaries[0].actual_attendees, Some(2));
    }

    #[test]
    fn accumulate_mode_sums_rows() {
        let a = GameId::generate();
        let rows = [
            row(a, Some(&["completed"])),
            row(a, Some(&["pending"])),
            row(a, Some(&["completed"])),
        ];

        let options = AggregateOptions::default().with_count_mode(CountMode::Accumulate);
        let result = aggregate_with(&rows, &options);
        assert_eq!(result.summaries[0].actual_attendees, Some(2));
    }

    #[test]
    fn summary_takes_first_row_fields() {
        let a = GameId::generate();
        let mut second = row(a, None);
        second.details.name = "Renamed".into();

        let result = aggregate(&[row(a, None), second]);
        assert_eq!(result.summaries[0].game.details.name, "Weekly game");
    }

    #[test]
    fn invalid_rows_are_skipped_and_reported() {
        let a = GameId::generate();
        let rows = [
            JoinRow {
                id: None,
                ..row(a, None)
            },
            row(a, Some(&["completed"])),
            JoinRow {
                id: Some("   ".into()),
                ..row(a, None)
            },
            JoinRow {
                id: Some("game-7".into()),
                ..row(a, None)
            },
        ];

        let result = aggregate(&rows);
        assert_eq!(ids(&result), vec![a]);
        assert_eq!(result.summaries[0].actual_attendees, Some(1));

        let indexes: Vec<usize> = result.errors.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![0, 2, 3]);
        assert!(result
            .errors
            .iter()
            .all(|e| matches!(e.error, CoreError::InvalidRow { .. }) && e.game_id.is_none()));
    }

    #[test]
    fn missing_status_makes_count_unknown() {
        let (a, b) = (GameId::generate(), GameId::generate());
        let mut broken = row(a, Some(&["completed"]));
        broken
            .game_attendees
            .as_mut()
            .unwrap()
            .push(AttendeeRef {
                id: None,
                payment_status: None,
            });

        let result = aggregate(&[broken, row(b, Some(&["completed"]))]);
        assert_eq!(result.summaries[0].actual_attendees, None);
        assert_eq!(result.summaries[1].actual_attendees, Some(1));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].game_id, Some(a));
        assert!(matches!(
            result.errors[0].error,
            CoreError::MissingField {
                field: "payment_status",
                ..
            }
        ));
    }

    #[test]
    fn unknown_count_is_sticky_when_accumulating() {
        let a = GameId::generate();
        let mut broken = row(a, None);
        broken.game_attendees = Some(vec![AttendeeRef {
            id: None,
            payment_status: None,
        }]);

        let options = AggregateOptions::default().with_count_mode(CountMode::Accumulate);
        let result = aggregate_with(&[broken, row(a, Some(&["completed"]))], &options);
        assert_eq!(result.summaries[0].actual_attendees, None);
    }

    #[test]
    fn group_filter_applies_before_aggregation() {
        let group = GroupId::generate();
        let (a, b) = (GameId::generate(), GameId::generate());

        let mut in_group = row(a, Some(&["completed"]));
        in_group.details.group_id = Some(group);
        let mut other_group = row(b, Some(&["completed"]));
        other_group.details.group_id = Some(GroupId::generate());
        let no_group = JoinRow {
            id: None,
            ..row(b, None)
        };

        let result = aggregate_with(
            &[other_group, in_group, no_group],
            &AggregateOptions::for_group(group),
        );
        assert_eq!(ids(&result), vec![a]);
        // The id-less row belongs to no group, so it is filtered rather than reported.
        assert!(result.is_clean());
    }

    #[test]
    fn count_mode_parses_from_config() {
        assert_eq!("accumulate".parse::<CountMode>(), Ok(CountMode::Accumulate));
        assert_eq!(" Last_Row ".parse::<CountMode>(), Ok(CountMode::LastRow));
        assert!("sum".parse::<CountMode>().is_err());
        assert_eq!(CountMode::default().as_str(), "last_row");
    }
}
