//! Error taxonomy of the booking engine.
//!
//! Every failure the engine can return is one variant of [`BookingError`].
//! Callers branch on the variant (or on [`ErrorKind`]) and map it to their
//! own status scheme; the engine never encodes meaning in message text.

use crate::types::{Money, MovieId, SeatKey, TicketId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The entity a lookup or a lock refers to
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// A movie (and its seat map)
    Movie(MovieId),
    /// A user (and their account)
    User(UserId),
    /// A user looked up by login name
    Username(String),
    /// A ticket record
    Ticket(TicketId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie(id) => write!(f, "movie {id}"),
            Self::User(id) => write!(f, "user {id}"),
            Self::Username(name) => write!(f, "username '{name}'"),
            Self::Ticket(id) => write!(f, "ticket {id}"),
        }
    }
}

/// Errors returned by booking operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The viewer is younger than the movie's age rating
    #[error("Age restricted: movie is rated {rating}+, viewer is {age}")]
    AgeRestricted {
        /// Minimum age of the movie
        rating: u32,
        /// Age of the viewer
        age: u32,
    },

    /// More seats requested than one purchase may hold
    #[error("Cannot book more than {limit} seats at once (requested: {requested})")]
    LimitExceeded {
        /// Seats in the request
        requested: usize,
        /// Per-purchase limit
        limit: usize,
    },

    /// The request named no seats
    #[error("No seats requested")]
    NoSeatsRequested,

    /// A requested seat is not part of the movie's layout
    #[error("Seat {0} does not exist")]
    SeatUnknown(SeatKey),

    /// A requested seat is already booked
    #[error("Seat {0} is already booked")]
    SeatUnavailable(SeatKey),

    /// The debit would take the balance below zero
    #[error("Insufficient balance: balance {balance} < required {required}")]
    InsufficientBalance {
        /// Balance at the time of the debit
        balance: Money,
        /// Amount that was requested
        required: Money,
    },

    /// A negative amount was passed to a balance operation
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// A ticket with this id exists or existed before
    #[error("Ticket id {0} already used")]
    DuplicateId(TicketId),

    /// The referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(Resource),

    /// Registration with a login name that is already in use
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// A lock could not be acquired in time; safe to retry
    #[error("Busy: gave up on {resource} after {waited:?}")]
    Busy {
        /// The contended entity
        resource: Resource,
        /// How long the call waited
        waited: Duration,
    },

    /// An unexpected failure after state had already changed (compensated)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// The kind of this error, without its payload
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AgeRestricted { .. } => ErrorKind::AgeRestricted,
            Self::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Self::NoSeatsRequested => ErrorKind::NoSeatsRequested,
            Self::SeatUnknown(_) => ErrorKind::SeatUnknown,
            Self::SeatUnavailable(_) => ErrorKind::SeatUnavailable,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::DuplicateId(_) => ErrorKind::DuplicateId,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UsernameTaken(_) => ErrorKind::UsernameTaken,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only lock contention is transient; business-rule failures need
    /// different input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Payload-free discriminant of [`BookingError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`BookingError::AgeRestricted`]
    AgeRestricted,
    /// See [`BookingError::LimitExceeded`]
    LimitExceeded,
    /// See [`BookingError::NoSeatsRequested`]
    NoSeatsRequested,
    /// See [`BookingError::SeatUnknown`]
    SeatUnknown,
    /// See [`BookingError::SeatUnavailable`]
    SeatUnavailable,
    /// See [`BookingError::InsufficientBalance`]
    InsufficientBalance,
    /// See [`BookingError::InvalidAmount`]
    InvalidAmount,
    /// See [`BookingError::DuplicateId`]
    DuplicateId,
    /// See [`BookingError::NotFound`]
    NotFound,
    /// See [`BookingError::UsernameTaken`]
    UsernameTaken,
    /// See [`BookingError::Busy`]
    Busy,
    /// See [`BookingError::Internal`]
    Internal,
}

impl ErrorKind {
    /// Stable snake_case label (metrics, logs, external status mapping)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgeRestricted => "age_restricted",
            Self::LimitExceeded => "limit_exceeded",
            Self::NoSeatsRequested => "no_seats_requested",
            Self::SeatUnknown => "seat_unknown",
            Self::SeatUnavailable => "seat_unavailable",
            Self::InsufficientBalance => "insufficient_balance",
            Self::InvalidAmount => "invalid_amount",
            Self::DuplicateId => "duplicate_id",
            Self::NotFound => "not_found",
            Self::UsernameTaken => "username_taken",
            Self::Busy => "busy",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid seat layouts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout would have no seats
    #[error("Seat layout has no seats")]
    Empty,

    /// Rows are lettered, so there can be at most `max` of them
    #[error("Seat layout has {rows} rows, at most {max} are supported")]
    TooManyRows {
        /// Requested rows
        rows: u8,
        /// Supported rows
        max: u8,
    },

    /// A seat with number 0 or a row that is not an uppercase letter
    #[error("Invalid seat {0} in layout")]
    InvalidSeat(SeatKey),
}
