//! In-memory storage implementation.
//!
//! Games keep their insertion order so listings with equal dates and times
//! come back in a stable order. Each game yields one join row with all of its
//! attendees nested, like the PostgreSQL backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use kickoff_core::{Attendee, AttendeeId, Game, GameId, JoinRow, PaymentStatus};

use crate::error::{Result, StoreError};
use crate::{GameQuery, Store};

/// In-memory store guarded by async read-write locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: RwLock<Vec<Game>>,
    attendees: RwLock<HashMap<AttendeeId, Attendee>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn join_rows<'a>(
        games: impl Iterator<Item = &'a Game>,
        attendees: &HashMap<AttendeeId, Attendee>,
    ) -> Vec<JoinRow> {
        let mut booked: Vec<&Attendee> = attendees.values().collect();
        booked.sort_by_key(|a| (a.created_at, a.id));

        games
            .map(|game| game.to_join_row(booked.iter().copied()))
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_game_rows(&self, query: &GameQuery) -> Result<Vec<JoinRow>> {
        let games = self.games.read().await;
        let attendees = self.attendees.read().await;

        let mut upcoming: Vec<&Game> = games
            .iter()
            .filter(|g| g.details.game_date >= query.from_date)
            .collect();
        // Stable sort keeps insertion order for ties.
        upcoming.sort_by_key(|g| (g.details.game_date, g.details.game_time));

        Ok(Self::join_rows(upcoming.into_iter(), &attendees))
    }

    async fn get_game_rows(&self, game_id: &GameId) -> Result<Vec<JoinRow>> {
        let games = self.games.read().await;
        let attendees = self.attendees.read().await;

        Ok(Self::join_rows(
            games.iter().filter(|g| g.id == *game_id),
            &attendees,
        ))
    }

    async fn put_game(&self, game: &Game) -> Result<()> {
        let mut games = self.games.write().await;
        if let Some(existing) = games.iter_mut().find(|g| g.id == game.id) {
            *existing = game.clone();
        } else {
            games.push(game.clone());
        }
        Ok(())
    }

    async fn put_attendee(&self, attendee: &Attendee) -> Result<()> {
        self.attendees
            .write()
            .await
            .insert(attendee.id, attendee.clone());
        Ok(())
    }

    async fn get_attendee(&self, attendee_id: &AttendeeId) -> Result<Option<Attendee>> {
        Ok(self.attendees.read().await.get(attendee_id).cloned())
    }

    async fn update_payment_status(
        &self,
        attendee_id: &AttendeeId,
        expected: &PaymentStatus,
        status: &PaymentStatus,
        stripe_session_id: Option<&str>,
    ) -> Result<Attendee> {
        let mut attendees = self.attendees.write().await;
        let attendee = attendees
            .get_mut(attendee_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "attendee",
                id: attendee_id.to_string(),
            })?;

        if attendee.payment_status != *expected {
            return Err(StoreError::Changed {
                entity: "attendee",
                id: attendee_id.to_string(),
            });
        }

        attendee.payment_status = status.clone();
        if let Some(session_id) = stripe_session_id {
            attendee.stripe_session_id = Some(session_id.to_string());
        }
        attendee.updated_at = Utc::now();

        tracing::debug!(
            attendee_id = %attendee_id,
            payment_status = %status,
            "Attendee payment status updated"
        );

        Ok(attendee.clone())
    }
}
