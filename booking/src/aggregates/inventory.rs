//! Inventory ledger: seat reservation and release for one movie.
//!
//! A reservation is all-or-nothing. The whole request is validated against
//! the seat map before a single flag changes, so a request that fails on its
//! last seat leaves the earlier seats exactly as they were.

use boxoffice_core::{BookingError, Clock, Ledger, MovieId, SeatKey, SeatMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Seats one purchase may hold unless configured otherwise
pub const DEFAULT_MAX_SEATS_PER_PURCHASE: usize = 6;

/// Environment dependencies for the inventory ledger
#[derive(Clone)]
pub struct InventoryEnvironment {
    /// Clock for event timestamps
    pub clock: Arc<dyn Clock>,
    /// Upper bound on seats in one reservation
    pub max_seats_per_purchase: usize,
}

impl InventoryEnvironment {
    /// Creates an environment with the default seat limit
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            max_seats_per_purchase: DEFAULT_MAX_SEATS_PER_PURCHASE,
        }
    }

    /// Overrides the per-purchase seat limit
    #[must_use]
    pub const fn with_max_seats(mut self, max_seats_per_purchase: usize) -> Self {
        self.max_seats_per_purchase = max_seats_per_purchase;
        self
    }
}

/// Requests against a seat map
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    /// Book every listed seat, or none of them
    Reserve {
        /// Seats in request order
        seats: Vec<SeatKey>,
    },
    /// Free the listed seats; unknown or already free seats are skipped
    Release {
        /// Seats to free
        seats: Vec<SeatKey>,
    },
}

/// Accepted seat-state transitions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    /// Seats went from free to booked
    SeatsReserved {
        /// Movie whose seats changed
        movie_id: MovieId,
        /// Seats in request order
        seats: Vec<SeatKey>,
        /// When the seats were booked
        reserved_at: DateTime<Utc>,
    },
    /// Seats went from booked to free
    SeatsReleased {
        /// Movie whose seats changed
        movie_id: MovieId,
        /// Seats that were actually booked before the release
        seats: Vec<SeatKey>,
        /// When the seats were freed
        released_at: DateTime<Utc>,
    },
}

impl InventoryEvent {
    /// Seats touched by the event
    #[must_use]
    pub fn seats(&self) -> &[SeatKey] {
        match self {
            Self::SeatsReserved { seats, .. } | Self::SeatsReleased { seats, .. } => seats,
        }
    }
}

/// Ledger guarding one movie's [`SeatMap`]
#[derive(Clone, Copy, Debug, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Creates a new `InventoryLedger`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a reservation request as a whole.
    ///
    /// Checks run in order: empty request, seat limit, then each seat in
    /// request order. The first failure wins.
    fn validate_reserve(
        seat_map: &SeatMap,
        seats: &[SeatKey],
        limit: usize,
    ) -> Result<(), BookingError> {
        if seats.is_empty() {
            return Err(BookingError::NoSeatsRequested);
        }

        if seats.len() > limit {
            return Err(BookingError::LimitExceeded {
                requested: seats.len(),
                limit,
            });
        }

        let mut claimed = BTreeSet::new();
        for seat in seats {
            match seat_map.is_booked(seat) {
                None => return Err(BookingError::SeatUnknown(*seat)),
                Some(true) => return Err(BookingError::SeatUnavailable(*seat)),
                // the same seat twice in one request cannot be booked twice
                Some(false) if !claimed.insert(*seat) => {
                    return Err(BookingError::SeatUnavailable(*seat));
                }
                Some(false) => {}
            }
        }

        Ok(())
    }

    /// Reserves `seats` and returns them in request order.
    ///
    /// # Errors
    ///
    /// `NoSeatsRequested`, `LimitExceeded`, `SeatUnknown` or
    /// `SeatUnavailable`; the seat map is unchanged in every case.
    pub fn reserve(
        &self,
        seat_map: &mut SeatMap,
        seats: Vec<SeatKey>,
        env: &InventoryEnvironment,
    ) -> Result<Vec<SeatKey>, BookingError> {
        match self.execute(seat_map, InventoryCommand::Reserve { seats }, env)? {
            InventoryEvent::SeatsReserved { seats, .. } => Ok(seats),
            InventoryEvent::SeatsReleased { .. } => Err(BookingError::Internal(
                "reserve produced a release event".to_string(),
            )),
        }
    }

    /// Frees `seats` and returns the ones that were booked.
    ///
    /// Never fails: unknown and already free seats are skipped.
    pub fn release(
        &self,
        seat_map: &mut SeatMap,
        seats: Vec<SeatKey>,
        env: &InventoryEnvironment,
    ) -> Vec<SeatKey> {
        let event = Self::release_event(seat_map, seats, env);
        self.apply(seat_map, &event);
        match event {
            InventoryEvent::SeatsReleased { seats, .. } | InventoryEvent::SeatsReserved { seats, .. } => {
                seats
            }
        }
    }

    fn release_event(
        seat_map: &SeatMap,
        seats: Vec<SeatKey>,
        env: &InventoryEnvironment,
    ) -> InventoryEvent {
        let mut freed = BTreeSet::new();
        let seats = seats
            .into_iter()
            .filter(|seat| seat_map.is_booked(seat) == Some(true) && freed.insert(*seat))
            .collect();

        InventoryEvent::SeatsReleased {
            movie_id: seat_map.movie_id(),
            seats,
            released_at: env.clock.now(),
        }
    }
}

impl Ledger for InventoryLedger {
    type State = SeatMap;
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Environment = InventoryEnvironment;

    fn decide(
        &self,
        state: &SeatMap,
        command: InventoryCommand,
        env: &InventoryEnvironment,
    ) -> Result<InventoryEvent, BookingError> {
        match command {
            InventoryCommand::Reserve { seats } => {
                Self::validate_reserve(state, &seats, env.max_seats_per_purchase)?;
                Ok(InventoryEvent::SeatsReserved {
                    movie_id: state.movie_id(),
                    seats,
                    reserved_at: env.clock.now(),
                })
            }
            InventoryCommand::Release { seats } => Ok(Self::release_event(state, seats, env)),
        }
    }

    fn apply(&self, state: &mut SeatMap, event: &InventoryEvent) {
        let booked = matches!(event, InventoryEvent::SeatsReserved { .. });
        for seat in event.seats() {
            state.mark(*seat, booked);
        }
        tracing::debug!(
            movie_id = %state.movie_id(),
            seats = event.seats().len(),
            booked,
            available = state.available(),
            "Applied inventory event"
        );
    }
}
