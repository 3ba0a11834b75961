//! Core types and logic for kickoff.
//!
//! This crate provides the pieces every kickoff component agrees on:
//!
//! - **Identifiers**: `GameId`, `AttendeeId`, `GroupId`, `PlayerId`
//! - **Games**: `Game`, `GameDetails`, `JoinRow`, `GameSummary`
//! - **Attendees**: `Attendee`, `PaymentStatus`, `PaymentOutcome`
//! - **Aggregation**: `aggregate`, `aggregate_with`, `AggregateOptions`, `CountMode`
//! - **Availability**: `with_availability`, `GameAvailability`
//!
//! Aggregation and availability are pure functions over data already fetched
//! by the store. They perform no I/O and hold no shared state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aggregate;
pub mod attendee;
pub mod availability;
pub mod error;
pub mod game;
pub mod ids;

pub use aggregate::{aggregate, aggregate_with, AggregateOptions, Aggregation, CountMode, RowError};
pub use attendee::{Attendee, AttendeeRef, PaymentOutcome, PaymentStatus};
pub use availability::{with_availability, GameAvailability};
pub use error::{CoreError, Result};
pub use game::{Game, GameDetails, GameSummary, GroupInfo, JoinRow, Organizer};
pub use ids::{AttendeeId, GameId, GroupId, IdError, PlayerId};
