//! Game listing handlers.
//!
//! Both listings and the detail endpoint go through [`build_listings`], which
//! runs the shared aggregator and availability view over the store's rows.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use kickoff_core::{
    aggregate_with, with_availability, AggregateOptions, CountMode, Game, GameId, GameSummary,
    GroupId, JoinRow,
};
use kickoff_store::GameQuery;

use crate::error::ApiError;
use crate::state::AppState;

/// A game as returned by the listing endpoints.
///
/// `actualAttendees` and `isFullyBooked` are `null` when they could not be
/// computed; `spotsLeft` is omitted once the game is fully booked.
#[derive(Debug, Serialize)]
pub struct GameListing {
    /// The game.
    #[serde(flatten)]
    pub game: Game,

    /// Attendees whose payment completed.
    #[serde(rename = "actualAttendees")]
    pub actual_attendees: Option<u32>,

    /// Seats still open.
    #[serde(rename = "spotsLeft", skip_serializing_if = "Option::is_none")]
    pub spots_left: Option<i64>,

    /// Whether the game has reached capacity.
    #[serde(rename = "isFullyBooked")]
    pub is_fully_booked: Option<bool>,
}

impl GameListing {
    /// Apply the availability view, degrading to unknown figures on error.
    fn from_summary(summary: GameSummary) -> Self {
        match with_availability(summary.clone()) {
            Ok(view) => Self {
                spots_left: view.display_spots_left(),
                is_fully_booked: Some(view.is_fully_booked),
                actual_attendees: view.summary.actual_attendees,
                game: view.summary.game,
            },
            Err(e) => {
                tracing::warn!(game_id = %summary.id(), error = %e, "Availability unavailable");
                Self {
                    game: summary.game,
                    actual_attendees: summary.actual_attendees,
                    spots_left: None,
                    is_fully_booked: None,
                }
            }
        }
    }
}

/// Game list response.
#[derive(Debug, Serialize)]
pub struct GameListResponse {
    /// Upcoming games, ascending by date.
    pub games: Vec<GameListing>,
    /// Number of games returned.
    pub count: usize,
}

impl From<Vec<GameListing>> for GameListResponse {
    fn from(games: Vec<GameListing>) -> Self {
        Self {
            count: games.len(),
            games,
        }
    }
}

/// Query parameters for listing games.
#[derive(Debug, Deserialize)]
pub struct ListGamesQuery {
    /// Only list games of this group.
    pub group_id: Option<String>,
}

/// Aggregate rows into listings, logging rows that had to be skipped.
pub fn build_listings(
    rows: &[JoinRow],
    group_id: Option<GroupId>,
    count_mode: CountMode,
) -> Vec<GameListing> {
    let options = AggregateOptions {
        group_id,
        count_mode,
    };
    let aggregation = aggregate_with(rows, &options);

    for row_error in &aggregation.errors {
        tracing::warn!(
            row_index = row_error.index,
            game_id = ?row_error.game_id,
            error = %row_error.error,
            "Unusable game row data"
        );
    }

    aggregation
        .summaries
        .into_iter()
        .map(GameListing::from_summary)
        .collect()
}

/// List upcoming games, optionally for one group.
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListGamesQuery>,
) -> Result<Json<GameListResponse>, ApiError> {
    let group_id = query
        .group_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_group_id)
        .transpose()?;

    upcoming(&state, group_id).await
}

/// List upcoming games of one group.
pub async fn list_group_games(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<GameListResponse>, ApiError> {
    let group_id = parse_group_id(&group_id)?;
    upcoming(&state, Some(group_id)).await
}

/// Get one game with its attendance figures.
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Result<Json<GameListing>, ApiError> {
    let game_id: GameId = game_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid game_id: {game_id}")))?;

    let rows = state.store.get_game_rows(&game_id).await?;

    build_listings(&rows, None, state.config.count_mode)
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Game not found: {game_id}")))
}

async fn upcoming(
    state: &AppState,
    group_id: Option<GroupId>,
) -> Result<Json<GameListResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let rows = state
        .store
        .list_game_rows(&GameQuery::upcoming(today))
        .await?;

    let listings = build_listings(&rows, group_id, state.config.count_mode);

    tracing::debug!(
        from_date = %today,
        group_id = ?group_id,
        rows = rows.len(),
        games = listings.len(),
        "Listed upcoming games"
    );

    Ok(Json(listings.into()))
}

fn parse_group_id(raw: &str) -> Result<GroupId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid group_id: {raw}")))
}
