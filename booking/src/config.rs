//! Configuration management for the box office.
//!
//! Loads configuration from environment variables with sensible defaults.

use boxoffice_core::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog feed configuration
    pub catalog: CatalogConfig,
    /// Booking engine configuration
    pub booking: BookingConfig,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Catalog feed configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// HTTP(S) URL serving the catalog as JSON
    pub url: Option<String>,
    /// Local JSON file with the catalog (used when no URL is set)
    pub path: Option<PathBuf>,
    /// Fetch timeout in seconds
    pub fetch_timeout: u64,
    /// Seat rows per movie (lettered from A)
    pub rows: u8,
    /// Seats in every row
    pub seats_per_row: u32,
}

/// Booking engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Upper bound on seats in one purchase
    pub max_seats_per_purchase: usize,
    /// How long an operation waits for a movie or user lock (milliseconds)
    pub lock_timeout_ms: u64,
    /// Retries after a `Busy` failure
    pub retry_max_attempts: u32,
    /// Delay before the first retry (milliseconds)
    pub retry_initial_delay_ms: u64,
    /// Buffered booking events per subscriber
    pub event_feed_capacity: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            fetch_timeout: 10,
            rows: 8,
            seats_per_row: 8,
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_seats_per_purchase: 6,
            lock_timeout_ms: 2000,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 50,
            event_feed_capacity: 256,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            booking: BookingConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing or unparsable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            catalog: CatalogConfig {
                url: lookup("CATALOG_URL").filter(|s| !s.trim().is_empty()),
                path: lookup("CATALOG_PATH")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
                fetch_timeout: parse_var(&lookup, "CATALOG_FETCH_TIMEOUT")
                    .unwrap_or(defaults.catalog.fetch_timeout),
                rows: parse_var(&lookup, "SEAT_ROWS").unwrap_or(defaults.catalog.rows),
                seats_per_row: parse_var(&lookup, "SEATS_PER_ROW").unwrap_or(defaults.catalog.seats_per_row),
            },
            booking: BookingConfig {
                max_seats_per_purchase: parse_var(&lookup, "MAX_SEATS_PER_PURCHASE")
                    .unwrap_or(defaults.booking.max_seats_per_purchase),
                lock_timeout_ms: parse_var(&lookup, "LOCK_TIMEOUT_MS")
                    .unwrap_or(defaults.booking.lock_timeout_ms),
                retry_max_attempts: parse_var(&lookup, "RETRY_MAX_ATTEMPTS")
                    .unwrap_or(defaults.booking.retry_max_attempts),
                retry_initial_delay_ms: parse_var(&lookup, "RETRY_INITIAL_DELAY_MS")
                    .unwrap_or(defaults.booking.retry_initial_delay_ms),
                event_feed_capacity: parse_var(&lookup, "EVENT_FEED_CAPACITY")
                    .unwrap_or(defaults.booking.event_feed_capacity),
            },
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl CatalogConfig {
    /// Fetch timeout as a `Duration`
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

impl BookingConfig {
    /// Lock acquisition timeout as a `Duration`
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Backoff policy for retrying `Busy` failures
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.retry_max_attempts)
            .initial_delay(Duration::from_millis(self.retry_initial_delay_ms))
            .build()
    }
}
