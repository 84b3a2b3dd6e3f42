//! In-memory ticket store.
//!
//! Live tickets sit in a map keyed by id. Ids of deleted tickets move to a
//! retired set so that no id is ever accepted twice.

use boxoffice_core::store::StoreFuture;
use boxoffice_core::{BookingError, Resource, Ticket, TicketId, TicketStore};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tickets {
    live: HashMap<TicketId, Ticket>,
    retired: HashSet<TicketId>,
}

/// [`TicketStore`] backed by a `HashMap`.
///
/// Cloning shares the underlying map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTicketStore {
    inner: Arc<RwLock<Tickets>>,
}

impl InMemoryTicketStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of all live tickets
    pub async fn ids(&self) -> Vec<TicketId> {
        self.inner.read().await.live.keys().copied().collect()
    }
}

impl TicketStore for InMemoryTicketStore {
    fn create(&self, ticket: Ticket) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tickets = self.inner.write().await;
            if tickets.retired.contains(&ticket.id) {
                return Err(BookingError::DuplicateId(ticket.id));
            }
            match tickets.live.entry(ticket.id) {
                Entry::Occupied(_) => Err(BookingError::DuplicateId(ticket.id)),
                Entry::Vacant(slot) => {
                    slot.insert(ticket);
                    Ok(())
                }
            }
        })
    }

    fn read(&self, id: TicketId) -> StoreFuture<'_, Ticket> {
        Box::pin(async move {
            self.inner
                .read()
                .await
                .live
                .get(&id)
                .cloned()
                .ok_or(BookingError::NotFound(Resource::Ticket(id)))
        })
    }

    fn delete(&self, id: TicketId) -> StoreFuture<'_, Ticket> {
        Box::pin(async move {
            let mut tickets = self.inner.write().await;
            let ticket = tickets
                .live
                .remove(&id)
                .ok_or(BookingError::NotFound(Resource::Ticket(id)))?;
            tickets.retired.insert(id);
            Ok(ticket)
        })
    }

    fn count(&self) -> StoreFuture<'_, usize> {
        Box::pin(async move { Ok(self.inner.read().await.live.len()) })
    }
}
