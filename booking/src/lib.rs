//! # Box Office
//!
//! Seat reservation and balance settlement for a movie theater.
//!
//! The engine books seats for registered users and pays for them from an
//! internal balance. A purchase either commits completely (seats booked,
//! cost debited, ticket stored) or leaves no trace; a cancellation returns
//! exactly the seats and the money of its ticket.
//!
//! ## Modules
//!
//! - [`aggregates`]: inventory ledger, account ledger, in-memory ticket store
//! - [`app`]: the [`BoxOffice`] orchestrator, registries, lock helpers, purchase saga
//! - [`catalog`]: loading movies from a JSON feed or file
//! - [`config`]: environment-driven configuration
//! - [`events`]: broadcast feed of committed operations
//! - [`metrics`]: business metrics
//!
//! ## Example
//!
//! ```no_run
//! use boxoffice::{BoxOffice, Catalog};
//! use boxoffice_core::{MovieId, NewUser, SeatKey, SeatLayout};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = SeatLayout::rectangular(8, 8)?;
//! let feed = br#"[{"id":1,"title":"Fast X","age_rating":15,"ticket_price":1000}]"#;
//! let office = BoxOffice::builder()
//!     .catalog(Catalog::from_json(feed, &layout)?)
//!     .build();
//!
//! let user = office
//!     .register_user(NewUser {
//!         username: "ana".into(),
//!         password_hash: "<hash>".into(),
//!         name: "Ana".into(),
//!         age: 20,
//!     })
//!     .await?;
//! office.top_up_balance(user.profile.id, 5000).await?;
//!
//! let ticket = office
//!     .purchase_ticket(user.profile.id, MovieId::new(1), vec![SeatKey::new('A', 1)])
//!     .await?;
//! office.cancel_ticket(user.profile.id, ticket.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregates;
pub mod app;
pub mod catalog;
pub mod config;
pub mod events;
pub mod metrics;

pub use app::{BoxOffice, BoxOfficeBuilder, MovieSummary, UserView};
pub use catalog::{Catalog, CatalogError, MovieRecord};
pub use config::{BookingConfig, CatalogConfig, Config};
pub use events::{BookingEvent, EventFeed};
