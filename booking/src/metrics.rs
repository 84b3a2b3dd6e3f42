//! Business metrics for the box office.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `boxoffice_tickets_purchased_total` - Committed purchases
//! - `boxoffice_seats_sold_total` - Seats on committed purchases
//! - `boxoffice_revenue_cents_total` - Money debited for tickets
//! - `boxoffice_tickets_cancelled_total` - Completed cancellations
//! - `boxoffice_refunds_cents_total` - Money credited back on cancellation
//! - `boxoffice_purchase_failures_total{kind}` - Rejected purchases by error kind
//! - `boxoffice_balance_operations_total{operation}` - Top-ups and withdrawals
//! - `boxoffice_lock_timeouts_total{resource}` - Lock acquisitions that gave up
//!
//! ## Gauges
//! - `boxoffice_seats_available{movie_id}` - Free seats per movie

use boxoffice_core::{ErrorKind, Money, MovieId};
use metrics::{describe_counter, describe_gauge};

/// Register all metric descriptions.
///
/// Call once at startup, after installing a recorder.
pub fn register_business_metrics() {
    describe_counter!(
        "boxoffice_tickets_purchased_total",
        "Total number of committed ticket purchases"
    );
    describe_counter!(
        "boxoffice_seats_sold_total",
        "Total number of seats on committed purchases"
    );
    describe_counter!(
        "boxoffice_revenue_cents_total",
        "Total amount debited for tickets in cents"
    );
    describe_counter!(
        "boxoffice_tickets_cancelled_total",
        "Total number of cancelled tickets"
    );
    describe_counter!(
        "boxoffice_refunds_cents_total",
        "Total amount refunded on cancellation in cents"
    );
    describe_counter!(
        "boxoffice_purchase_failures_total",
        "Rejected purchase attempts by error kind"
    );
    describe_counter!(
        "boxoffice_balance_operations_total",
        "Balance operations by type (top_up, withdraw)"
    );
    describe_counter!(
        "boxoffice_lock_timeouts_total",
        "Lock acquisitions that timed out by resource type"
    );
    describe_gauge!(
        "boxoffice_seats_available",
        "Free seats per movie"
    );

    tracing::info!("Business metrics registered");
}

/// Record a committed purchase.
pub fn record_purchase(seats: usize, cost: Money) {
    metrics::counter!("boxoffice_tickets_purchased_total").increment(1);
    metrics::counter!("boxoffice_seats_sold_total").increment(seats as u64);
    metrics::counter!("boxoffice_revenue_cents_total").increment(cost.cents());
}

/// Record a rejected purchase.
pub fn record_purchase_failure(kind: ErrorKind) {
    metrics::counter!("boxoffice_purchase_failures_total", "kind" => kind.as_str()).increment(1);
}

/// Record a completed cancellation.
pub fn record_cancellation(refund: Money) {
    metrics::counter!("boxoffice_tickets_cancelled_total").increment(1);
    metrics::counter!("boxoffice_refunds_cents_total").increment(refund.cents());
}

/// Record a top-up or withdrawal.
pub fn record_balance_operation(operation: &'static str) {
    metrics::counter!("boxoffice_balance_operations_total", "operation" => operation).increment(1);
}

/// Record a lock timeout.
pub fn record_lock_timeout(resource: &'static str) {
    metrics::counter!("boxoffice_lock_timeouts_total", "resource" => resource).increment(1);
}

/// Publish the free seat count of a movie.
#[allow(clippy::cast_precision_loss)] // seat counts are far below 2^52
pub fn record_seats_available(movie_id: MovieId, available: usize) {
    metrics::gauge!("boxoffice_seats_available", "movie_id" => movie_id.to_string())
        .set(available as f64);
}
