//! Injected dependencies.
//!
//! Time and ticket ids come from traits so that tests can pin both.

use crate::types::TicketId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of fresh ticket ids.
///
/// Implementations should not repeat ids; the ticket store still rejects a
/// repeated id with `DuplicateId`.
pub trait TicketIdGenerator: Send + Sync {
    /// Produce the id for the next ticket
    fn next_ticket_id(&self) -> TicketId;
}

/// Random (v4) ticket ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTicketIds;

impl TicketIdGenerator for UuidTicketIds {
    fn next_ticket_id(&self) -> TicketId {
        TicketId::from_uuid(Uuid::new_v4())
    }
}
