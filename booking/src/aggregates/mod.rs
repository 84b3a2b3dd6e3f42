//! State-owning components of the engine.
//!
//! - `inventory` - seat reservation/release per movie
//! - `account` - debit/credit per user
//! - `tickets` - in-memory ticket store

pub mod account;
pub mod inventory;
pub mod tickets;

pub use account::{AccountCommand, AccountEnvironment, AccountEvent, AccountLedger, validate_amount};
pub use inventory::{
    DEFAULT_MAX_SEATS_PER_PURCHASE, InventoryCommand, InventoryEnvironment, InventoryEvent,
    InventoryLedger,
};
pub use tickets::InMemoryTicketStore;
