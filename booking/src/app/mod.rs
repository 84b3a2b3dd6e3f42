//! Booking orchestrator and the registries it works on.

mod box_office;
pub mod locking;
pub mod registry;
pub mod saga;

pub use box_office::{BoxOffice, BoxOfficeBuilder, MovieSummary, UserView};
pub use saga::{Compensation, PurchaseSaga, PurchaseStage};
