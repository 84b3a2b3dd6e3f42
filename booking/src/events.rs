//! Booking event feed.
//!
//! Every committed operation publishes one [`BookingEvent`] on a broadcast
//! channel. Subscribers that fall behind lose the oldest events.

use boxoffice_core::{Money, MovieId, SeatKey, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A committed change in the box office
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    /// A user account was created
    UserRegistered {
        /// New user
        user_id: UserId,
        /// Login name
        username: String,
        /// When
        at: DateTime<Utc>,
    },
    /// Seats were sold
    TicketPurchased {
        /// The ticket
        ticket_id: TicketId,
        /// Buyer
        user_id: UserId,
        /// Movie
        movie_id: MovieId,
        /// Seats in request order
        seats: Vec<SeatKey>,
        /// Amount debited
        cost: Money,
        /// When
        at: DateTime<Utc>,
    },
    /// A ticket was cancelled and refunded
    TicketCancelled {
        /// The ticket
        ticket_id: TicketId,
        /// Owner
        user_id: UserId,
        /// Movie
        movie_id: MovieId,
        /// Seats returned to sale
        seats: Vec<SeatKey>,
        /// Amount credited back
        refund: Money,
        /// When
        at: DateTime<Utc>,
    },
    /// Money was added to a balance
    BalanceToppedUp {
        /// Account owner
        user_id: UserId,
        /// Amount added
        amount: Money,
        /// Balance afterwards
        balance: Money,
        /// When
        at: DateTime<Utc>,
    },
    /// Money was taken from a balance
    BalanceWithdrawn {
        /// Account owner
        user_id: UserId,
        /// Amount taken
        amount: Money,
        /// Balance afterwards
        balance: Money,
        /// When
        at: DateTime<Utc>,
    },
}

impl BookingEvent {
    /// Short name of the event type
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user_registered",
            Self::TicketPurchased { .. } => "ticket_purchased",
            Self::TicketCancelled { .. } => "ticket_cancelled",
            Self::BalanceToppedUp { .. } => "balance_topped_up",
            Self::BalanceWithdrawn { .. } => "balance_withdrawn",
        }
    }

    /// User the event concerns
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::UserRegistered { user_id, .. }
            | Self::TicketPurchased { user_id, .. }
            | Self::TicketCancelled { user_id, .. }
            | Self::BalanceToppedUp { user_id, .. }
            | Self::BalanceWithdrawn { user_id, .. } => *user_id,
        }
    }
}

/// Broadcast sender for booking events
#[derive(Clone, Debug)]
pub struct EventFeed {
    sender: broadcast::Sender<BookingEvent>,
}

impl EventFeed {
    /// Creates a feed that buffers `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event; having no subscribers is fine
    pub fn publish(&self, event: BookingEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => tracing::trace!(event_type, receivers, "Published booking event"),
            Err(_) => tracing::trace!(event_type, "No subscribers for booking event"),
        }
    }

    /// New receiver that sees events published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}
