//! # Box Office Testing
//!
//! Testing utilities for the box office engine.
//!
//! This crate provides:
//! - Mock implementations of the environment traits (clock, ticket ids)
//! - Fixtures for movies, layouts and users
//! - A given/when/then harness for ledgers
//! - proptest strategies for domain types
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_testing::{fixtures::MovieBuilder, test_clock};
//!
//! let office = BoxOffice::builder()
//!     .movies([MovieBuilder::new(1).price(1000).age_rating(17).build()])
//!     .clock(Arc::new(test_clock()))
//!     .build();
//! ```

use boxoffice_core::environment::{Clock, TicketIdGenerator};
use boxoffice_core::TicketId;
use chrono::{DateTime, Utc};

pub mod fixtures;
pub mod properties;

pub use ledger_test::LedgerTest;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, TicketId, TicketIdGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Ticket ids 1, 2, 3, ... encoded as UUIDs
    #[derive(Debug, Default)]
    pub struct SequentialTicketIds {
        next: AtomicU64,
    }

    impl SequentialTicketIds {
        /// Starts the sequence at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }

        /// The id the `n`th call (1-based) returns
        #[must_use]
        pub fn nth(n: u64) -> TicketId {
            TicketId::from_uuid(Uuid::from_u128(u128::from(n)))
        }
    }

    impl TicketIdGenerator for SequentialTicketIds {
        fn next_ticket_id(&self) -> TicketId {
            let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
            Self::nth(n)
        }
    }

    /// Hands out the same ticket id every time.
    ///
    /// Drives the store's duplicate-id path.
    #[derive(Debug, Clone, Copy)]
    pub struct RecyclingTicketIds(pub TicketId);

    impl TicketIdGenerator for RecyclingTicketIds {
        fn next_ticket_id(&self) -> TicketId {
            self.0
        }
    }
}

pub use mocks::{FixedClock, RecyclingTicketIds, SequentialTicketIds, test_clock};
