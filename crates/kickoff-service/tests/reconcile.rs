//! Payment reconciliation under concurrent status changes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use kickoff_core::{
    Attendee, AttendeeId, Game, GameDetails, GameId, JoinRow, PaymentOutcome, PaymentStatus,
};
use kickoff_service::handlers::webhooks::reconcile_payment;
use kickoff_service::{ApiError, AppState, ServiceConfig};
use kickoff_store::{GameQuery, MemoryStore, Result, Store};

/// A store where another webhook commits a status change right after every
/// attendee read, for the first `interleavings` reads.
struct InterleavingStore {
    inner: MemoryStore,
    interleavings: AtomicUsize,
    concurrent: fn(&PaymentStatus) -> PaymentStatus,
}

impl InterleavingStore {
    fn new(interleavings: usize, concurrent: fn(&PaymentStatus) -> PaymentStatus) -> Self {
        Self {
            inner: MemoryStore::new(),
            interleavings: AtomicUsize::new(interleavings),
            concurrent,
        }
    }

    fn take_interleaving(&self) -> bool {
        self.interleavings
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Store for InterleavingStore {
    async fn list_game_rows(&self, query: &GameQuery) -> Result<Vec<JoinRow>> {
        self.inner.list_game_rows(query).await
    }

    async fn get_game_rows(&self, game_id: &GameId) -> Result<Vec<JoinRow>> {
        self.inner.get_game_rows(game_id).await
    }

    async fn put_game(&self, game: &Game) -> Result<()> {
        self.inner.put_game(game).await
    }

    async fn put_attendee(&self, attendee: &Attendee) -> Result<()> {
        self.inner.put_attendee(attendee).await
    }

    async fn get_attendee(&self, attendee_id: &AttendeeId) -> Result<Option<Attendee>> {
        let snapshot = self.inner.get_attendee(attendee_id).await?;

        if let Some(read) = &snapshot {
            if self.take_interleaving() {
                let status = (self.concurrent)(&read.payment_status);
                self.inner
                    .update_payment_status(attendee_id, &read.payment_status, &status, None)
                    .await?;
            }
        }

        Ok(snapshot)
    }

    async fn update_payment_status(
        &self,
        attendee_id: &AttendeeId,
        expected: &PaymentStatus,
        status: &PaymentStatus,
        stripe_session_id: Option<&str>,
    ) -> Result<Attendee> {
        self.inner
            .update_payment_status(attendee_id, expected, status, stripe_session_id)
            .await
    }
}

async fn seed(store: &InterleavingStore, status: PaymentStatus) -> Attendee {
    let date = NaiveDate::from_ymd_opt(2026, 11, 5).expect("valid date");
    let game = Game::new(GameDetails::new("Thursday", date));
    store.put_game(&game).await.expect("seed game");

    let attendee = Attendee::pending(game.id, None).with_status(status);
    store.put_attendee(&attendee).await.expect("seed attendee");
    attendee
}

#[tokio::test]
async fn refund_between_read_and_write_keeps_booking_cancelled() {
    let store = Arc::new(InterleavingStore::new(1, |_| PaymentStatus::Cancelled));
    let attendee = seed(&store, PaymentStatus::Pending).await;
    let state = AppState::new(store.clone(), ServiceConfig::default());

    let status = reconcile_payment(
        &state,
        &attendee.id.to_string(),
        PaymentOutcome::Confirmed,
        Some("cs_test_late"),
    )
    .await
    .expect("rejected outcome is acknowledged");

    assert_eq!(status, PaymentStatus::Cancelled);
    let stored = store
        .get_attendee(&attendee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Cancelled);
    assert!(stored.stripe_session_id.is_none());
}

#[tokio::test]
async fn failure_between_read_and_write_is_reapplied() {
    let store = Arc::new(InterleavingStore::new(1, |_| PaymentStatus::Failed));
    let attendee = seed(&store, PaymentStatus::Pending).await;
    let state = AppState::new(store.clone(), ServiceConfig::default());

    let status = reconcile_payment(
        &state,
        &attendee.id.to_string(),
        PaymentOutcome::Confirmed,
        Some("cs_test_retry"),
    )
    .await
    .unwrap();

    assert_eq!(status, PaymentStatus::Completed);
    let stored = store
        .get_attendee(&attendee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Completed);
    assert_eq!(stored.stripe_session_id.as_deref(), Some("cs_test_retry"));
}

#[tokio::test]
async fn status_that_keeps_changing_gives_up_with_conflict() {
    let store = Arc::new(InterleavingStore::new(usize::MAX, |status| {
        if *status == PaymentStatus::Pending {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Pending
        }
    }));
    let attendee = seed(&store, PaymentStatus::Pending).await;
    let state = AppState::new(store.clone(), ServiceConfig::default());

    let err = reconcile_payment(
        &state,
        &attendee.id.to_string(),
        PaymentOutcome::Confirmed,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
    let stored = store
        .get_attendee(&attendee.id)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.payment_status, PaymentStatus::Completed);
}
