//! Ticket persistence seam.
//!
//! The engine only needs three operations from storage: create with a
//! uniqueness check, read by id and delete. Anything that provides them
//! (an in-memory map, a database table) can back the booking engine.

use crate::error::BookingError;
use crate::types::{Ticket, TicketId};
use std::future::Future;
use std::pin::Pin;

/// Result future returned by [`TicketStore`] methods
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BookingError>> + Send + 'a>>;

/// Storage for committed tickets.
///
/// # Contract
///
/// - `create` fails with [`BookingError::DuplicateId`] when the id is present
///   or was ever present. The check and the insert are one atomic step.
/// - `read` and `delete` fail with [`BookingError::NotFound`] for absent ids.
/// - A deleted ticket is never returned again and its id is never reissued.
///
/// The trait returns boxed futures so the engine can hold it as
/// `Arc<dyn TicketStore>`.
pub trait TicketStore: Send + Sync {
    /// Insert a new ticket.
    ///
    /// # Errors
    ///
    /// [`BookingError::DuplicateId`] if the id is or was in use.
    fn create(&self, ticket: Ticket) -> StoreFuture<'_, ()>;

    /// Fetch a ticket by id.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] if no such ticket exists.
    fn read(&self, id: TicketId) -> StoreFuture<'_, Ticket>;

    /// Remove a ticket and return it.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] if no such ticket exists.
    fn delete(&self, id: TicketId) -> StoreFuture<'_, Ticket>;

    /// Number of live tickets
    fn count(&self) -> StoreFuture<'_, usize>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::sync::Arc;

    /// A store that holds nothing and accepts nothing
    struct Closed;

    impl TicketStore for Closed {
        fn create(&self, ticket: Ticket) -> StoreFuture<'_, ()> {
            Box::pin(async move { Err(BookingError::DuplicateId(ticket.id)) })
        }

        fn read(&self, id: TicketId) -> StoreFuture<'_, Ticket> {
            Box::pin(async move { Err(BookingError::NotFound(crate::Resource::Ticket(id))) })
        }

        fn delete(&self, id: TicketId) -> StoreFuture<'_, Ticket> {
            self.read(id)
        }

        fn count(&self) -> StoreFuture<'_, usize> {
            Box::pin(async { Ok(0) })
        }
    }

    #[test]
    fn usable_as_trait_object() {
        let store: Arc<dyn TicketStore> = Arc::new(Closed);
        let id = TicketId::from_uuid(uuid::Uuid::nil());

        let error = tokio_test::block_on(store.read(id)).unwrap_err();
        assert_eq!(error, BookingError::NotFound(crate::Resource::Ticket(id)));
        assert_eq!(tokio_test::block_on(store.count()), Ok(0));
    }
}
