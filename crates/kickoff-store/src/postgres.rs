//! PostgreSQL storage implementation.
//!
//! Listing queries nest every attendee of a game into that game's single row
//! with `json_agg`, so each game yields exactly one join row.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use kickoff_core::{
    Attendee, AttendeeId, AttendeeRef, Game, GameDetails, GameId, GroupInfo, JoinRow, Organizer,
    PaymentStatus,
};

use crate::error::{Result, StoreError};
use crate::{GameQuery, Store};

const GAME_ROW_SELECT: &str = r"
    SELECT
        g.id,
        g.name,
        g.description,
        g.game_date,
        g.game_time,
        g.location,
        g.price::float8 AS price,
        g.total_tickets::int8 AS total_tickets,
        g.available_tickets::int8 AS available_tickets,
        g.duration_hours::float8 AS duration_hours,
        g.created_at,
        g.created_by,
        g.group_id,
        CASE WHEN gr.id IS NULL THEN NULL
             ELSE json_build_object('name', gr.name, 'whatsapp_group', gr.whatsapp_group)
        END AS groups,
        CASE WHEN p.id IS NULL THEN NULL
             ELSE json_build_object('id', p.id, 'name', p.name, 'photo_url', p.photo_url)
        END AS organizer,
        COALESCE(
            (SELECT json_agg(json_build_object('id', a.id, 'payment_status', a.payment_status)
                             ORDER BY a.created_at)
               FROM game_attendees a
              WHERE a.game_id = g.id),
            '[]'::json
        ) AS game_attendees
    FROM games g
    LEFT JOIN groups gr ON gr.id = g.group_id
    LEFT JOIN players p ON p.id = g.created_by
";

const ATTENDEE_COLUMNS: &str =
    "id, game_id, player_id, payment_status, stripe_session_id, created_at, updated_at";

/// PostgreSQL-backed storage implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        tracing::info!(max_connections, "PostgreSQL pool connected");

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    fn join_row(row: &PgRow) -> Result<JoinRow> {
        let id: Uuid = row.try_get("id")?;
        let groups: Option<Json<GroupInfo>> = row.try_get("groups")?;
        let organizer: Option<Json<Organizer>> = row.try_get("organizer")?;
        let attendees: Json<Vec<AttendeeRef>> = row.try_get("game_attendees")?;
        let created_by: Option<Uuid> = row.try_get("created_by")?;
        let group_id: Option<Uuid> = row.try_get("group_id")?;

        Ok(JoinRow {
            id: Some(id.to_string()),
            details: GameDetails {
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                game_date: row.try_get("game_date")?,
                game_time: row.try_get("game_time")?,
                location: row.try_get("location")?,
                price: row.try_get("price")?,
                total_tickets: row.try_get("total_tickets")?,
                available_tickets: row.try_get("available_tickets")?,
                duration_hours: row.try_get("duration_hours")?,
                created_at: row.try_get("created_at")?,
                created_by: created_by.map(Into::into),
                group_id: group_id.map(Into::into),
                groups: groups.map(|Json(g)| g),
                organizer: organizer.map(|Json(o)| o),
            },
            game_attendees: Some(attendees.0),
        })
    }

    fn attendee(row: &PgRow) -> Result<Attendee> {
        let id: Uuid = row.try_get("id")?;
        let game_id: Uuid = row.try_get("game_id")?;
        let player_id: Option<Uuid> = row.try_get("player_id")?;
        let payment_status: String = row.try_get("payment_status")?;

        Ok(Attendee {
            id: id.into(),
            game_id: game_id.into(),
            player_id: player_id.map(Into::into),
            payment_status: PaymentStatus::from(payment_status),
            stripe_session_id: row.try_get("stripe_session_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_game_rows(&self, query: &GameQuery) -> Result<Vec<JoinRow>> {
        let sql = format!(
            "{GAME_ROW_SELECT} WHERE g.game_date >= $1 ORDER BY g.game_date ASC, g.game_time ASC NULLS FIRST"
        );
        let rows = sqlx::query(&sql)
            .bind(query.from_date)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(from_date = %query.from_date, rows = rows.len(), "Fetched game rows");

        rows.iter().map(Self::join_row).collect()
    }

    async fn get_game_rows(&self, game_id: &GameId) -> Result<Vec<JoinRow>> {
        let sql = format!("{GAME_ROW_SELECT} WHERE g.id = $1");
        let rows = sqlx::query(&sql)
            .bind(*game_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::join_row).collect()
    }

    async fn put_game(&self, game: &Game) -> Result<()> {
        let d = &game.details;
        sqlx::query(
            r"
            INSERT INTO games (
                id, name, description, game_date, game_time, location, price,
                total_tickets, available_tickets, duration_hours, created_at,
                created_by, group_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7::float8, $8::int8, $9::int8, $10::float8,
                    COALESCE($11, now()), $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                game_date = EXCLUDED.game_date,
                game_time = EXCLUDED.game_time,
                location = EXCLUDED.location,
                price = EXCLUDED.price,
                total_tickets = EXCLUDED.total_tickets,
                available_tickets = EXCLUDED.available_tickets,
                duration_hours = EXCLUDED.duration_hours,
                created_by = EXCLUDED.created_by,
                group_id = EXCLUDED.group_id
            ",
        )
        .bind(*game.id.as_uuid())
        .bind(&d.name)
        .bind(&d.description)
        .bind(d.game_date)
        .bind(d.game_time)
        .bind(&d.location)
        .bind(d.price)
        .bind(d.total_tickets)
        .bind(d.available_tickets)
        .bind(d.duration_hours)
        .bind(d.created_at)
        .bind(d.created_by.map(|p| *p.as_uuid()))
        .bind(d.group_id.map(|g| *g.as_uuid()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn put_attendee(&self, attendee: &Attendee) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO game_attendees (
                id, game_id, player_id, payment_status, stripe_session_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                payment_status = EXCLUDED.payment_status,
                stripe_session_id = EXCLUDED.stripe_session_id,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(*attendee.id.as_uuid())
        .bind(*attendee.game_id.as_uuid())
        .bind(attendee.player_id.map(|p| *p.as_uuid()))
        .bind(attendee.payment_status.as_str())
        .bind(&attendee.stripe_session_id)
        .bind(attendee.created_at)
        .bind(attendee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_attendee(&self, attendee_id: &AttendeeId) -> Result<Option<Attendee>> {
        let sql = format!("SELECT {ATTENDEE_COLUMNS} FROM game_attendees WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*attendee_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::attendee).transpose()
    }

    async fn update_payment_status(
        &self,
        attendee_id: &AttendeeId,
        expected: &PaymentStatus,
        status: &PaymentStatus,
        stripe_session_id: Option<&str>,
    ) -> Result<Attendee> {
        let sql = format!(
            "UPDATE game_attendees
                SET payment_status = $2,
                    stripe_session_id = COALESCE($3, stripe_session_id),
                    updated_at = now()
              WHERE id = $1 AND payment_status = $4
          RETURNING {ATTENDEE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(*attendee_id.as_uuid())
            .bind(status.as_str())
            .bind(stripe_session_id)
            .bind(expected.as_str())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Self::attendee(&row);
        }

        let id = attendee_id.to_string();
        if self.get_attendee(attendee_id).await?.is_some() {
            Err(StoreError::Changed {
                entity: "attendee",
                id,
            })
        } else {
            Err(StoreError::NotFound {
                entity: "attendee",
                id,
            })
        }
    }
}
