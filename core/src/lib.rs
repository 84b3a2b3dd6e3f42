//! # Box Office Core
//!
//! Domain vocabulary for the seat-reservation and balance-settlement engine.
//!
//! This crate holds everything the engine and its callers share:
//!
//! - **Types**: identifiers, `Money`, seat keys, seat layouts and seat maps,
//!   movies, users and tickets
//! - **Errors**: the closed [`BookingError`] taxonomy callers branch on
//! - **Ledger**: the validate-then-apply trait every state-owning component implements
//! - **Environment**: injected dependencies (clock, ticket id generator)
//! - **Store**: the ticket persistence seam
//! - **Retry**: backoff helpers for lock-contention failures
//!
//! ## Architecture Principles
//!
//! - Validation never mutates: a command is checked as a whole before any state changes
//! - Errors are typed variants, never sentinel strings
//! - Dependencies are injected through traits so tests control time and ids
//!
//! ## Example
//!
//! ```
//! use boxoffice_core::{MovieId, SeatKey, SeatLayout, SeatMap};
//!
//! let layout = SeatLayout::rectangular(8, 8).unwrap();
//! let mut seats = SeatMap::from_layout(MovieId::new(1), &layout);
//!
//! assert_eq!(seats.available(), 64);
//! seats.mark(SeatKey::new('A', 1), true);
//! assert_eq!(seats.is_booked(&SeatKey::new('A', 1)), Some(true));
//! ```

pub mod environment;
pub mod error;
pub mod ledger;
pub mod retry;
pub mod store;
pub mod types;

pub use environment::{Clock, SystemClock, TicketIdGenerator, UuidTicketIds};
pub use error::{BookingError, ErrorKind, LayoutError, Resource};
pub use ledger::Ledger;
pub use store::TicketStore;
pub use types::*;
