//! Bounded lock acquisition.
//!
//! Every movie and every user sits behind its own mutex. No operation waits
//! for one of them longer than the configured timeout; past it the call
//! fails with [`BookingError::Busy`] and the caller may retry.
//!
//! Lock order for operations that need both: movie, then user. Guards are
//! dropped in reverse order.

use crate::metrics;
use boxoffice_core::{BookingError, Resource};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Acquires `mutex` or gives up after `timeout`.
///
/// # Errors
///
/// [`BookingError::Busy`] naming `resource` when the wait runs out.
pub async fn acquire<'a, T>(
    mutex: &'a Mutex<T>,
    resource: Resource,
    timeout: Duration,
) -> Result<MutexGuard<'a, T>, BookingError> {
    if let Ok(guard) = tokio::time::timeout(timeout, mutex.lock()).await {
        return Ok(guard);
    }

    let label = resource_label(&resource);
    metrics::record_lock_timeout(label);
    tracing::warn!(%resource, timeout_ms = timeout.as_millis(), "Lock acquisition timed out");

    Err(BookingError::Busy {
        resource,
        waited: timeout,
    })
}

const fn resource_label(resource: &Resource) -> &'static str {
    match resource {
        Resource::Movie(_) => "movie",
        Resource::User(_) | Resource::Username(_) => "user",
        Resource::Ticket(_) => "ticket",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use boxoffice_core::MovieId;

    #[tokio::test]
    async fn free_lock_is_acquired() {
        let mutex = Mutex::new(5);
        let guard = acquire(&mutex, Resource::Movie(MovieId::new(1)), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(*guard, 5);
    }

    #[tokio::test]
    async fn held_lock_times_out_as_busy() {
        let mutex = Mutex::new(());
        let _held = mutex.lock().await;

        let result = acquire(&mutex, Resource::Movie(MovieId::new(2)), Duration::from_millis(5)).await;

        match result {
            Err(BookingError::Busy { resource, waited }) => {
                assert_eq!(resource, Resource::Movie(MovieId::new(2)));
                assert_eq!(waited, Duration::from_millis(5));
            }
            other => panic!("expected Busy, got {other:?}"),
        }
    }
}
