//! Storage layer for kickoff.
//!
//! The [`Store`] trait is the data-store collaborator the listing endpoints and
//! the payment webhook depend on. It is injected as `Arc<dyn Store>`; nothing
//! in kickoff reaches for a global client.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL via `sqlx` (feature `postgres-backend`, on by default)
//! - [`MemoryStore`]: in-process maps, for development and tests
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> kickoff_store::Result<()> {
//! use chrono::Utc;
//! use kickoff_store::{GameQuery, MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let rows = store.list_game_rows(&GameQuery::upcoming(Utc::now().date_naive())).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "postgres-backend")]
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use kickoff_core::{Attendee, AttendeeId, Game, GameId, JoinRow, PaymentStatus};

/// Which games a listing should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameQuery {
    /// Earliest game date to include (inclusive).
    pub from_date: NaiveDate,
}

impl GameQuery {
    /// Games on or after `today`.
    #[must_use]
    pub const fn upcoming(today: NaiveDate) -> Self {
        Self { from_date: today }
    }
}

/// The storage trait defining all database operations.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Game Operations
    // =========================================================================

    /// List join rows for games on or after `query.from_date`, ascending by
    /// date then time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_game_rows(&self, query: &GameQuery) -> Result<Vec<JoinRow>>;

    /// Get the join rows for a single game, regardless of its date.
    ///
    /// Returns an empty list if the game does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_game_rows(&self, game_id: &GameId) -> Result<Vec<JoinRow>>;

    /// Insert or update a game.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_game(&self, game: &Game) -> Result<()>;

    // =========================================================================
    // Attendee Operations
    // =========================================================================

    /// Insert or update an attendee.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_attendee(&self, attendee: &Attendee) -> Result<()>;

    /// Get an attendee by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_attendee(&self, attendee_id: &AttendeeId) -> Result<Option<Attendee>>;

    /// Move an attendee from `expected` to `status` and return the updated record.
    ///
    /// The write only applies while the stored status still equals `expected`.
    /// It is durable when this returns: any listing read issued afterwards
    /// observes the new status.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Changed` if the stored status is no longer
    /// `expected`, and `StoreError::NotFound` if the attendee doesn't exist.
    async fn update_payment_status(
        &self,
        attendee_id: &AttendeeId,
        expected: &PaymentStatus,
        status: &PaymentStatus,
        stripe_session_id: Option<&str>,
    ) -> Result<Attendee>;
}
