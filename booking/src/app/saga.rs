//! Purchase saga.
//!
//! A purchase walks through these stages:
//!
//! ```text
//! Requested -> AgeChecked -> SeatsReserved -> BalanceDebited -> TicketCommitted
//!     \____________\______________\________________\______> Failed
//! ```
//!
//! Each stage that changes shared state pushes the action that undoes it.
//! On failure the stack is unwound last-in first-out: refund the debit,
//! then release the seats, whichever of them happened.

use crate::aggregates::{AccountEnvironment, AccountLedger, InventoryEnvironment, InventoryLedger};
use boxoffice_core::{Account, BookingError, Money, SeatKey, SeatMap};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Where a purchase attempt currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseStage {
    /// Intent received, nothing checked yet
    Requested,
    /// Viewer is old enough for the movie
    AgeChecked,
    /// Seats are booked on the movie
    SeatsReserved,
    /// Cost has been taken from the balance
    BalanceDebited,
    /// Ticket persisted; terminal
    TicketCommitted,
    /// Rejected and compensated; terminal
    Failed,
}

impl PurchaseStage {
    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TicketCommitted | Self::Failed)
    }
}

impl fmt::Display for PurchaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requested => "requested",
            Self::AgeChecked => "age_checked",
            Self::SeatsReserved => "seats_reserved",
            Self::BalanceDebited => "balance_debited",
            Self::TicketCommitted => "ticket_committed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// An undo action recorded by a completed stage
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compensation {
    /// Free seats that this purchase booked
    ReleaseSeats(Vec<SeatKey>),
    /// Give back money that this purchase debited
    Refund(Money),
}

/// State of one purchase attempt
#[derive(Debug)]
pub struct PurchaseSaga {
    stage: PurchaseStage,
    compensations: SmallVec<[Compensation; 2]>,
}

impl Default for PurchaseSaga {
    fn default() -> Self {
        Self::new()
    }
}

impl PurchaseSaga {
    /// A saga in the `Requested` stage
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: PurchaseStage::Requested,
            compensations: SmallVec::new(),
        }
    }

    /// Current stage
    #[must_use]
    pub const fn stage(&self) -> PurchaseStage {
        self.stage
    }

    /// Pending undo actions, oldest first
    #[must_use]
    pub fn compensations(&self) -> &[Compensation] {
        &self.compensations
    }

    /// Moves to `stage`, recording how to undo it
    pub fn advance(&mut self, stage: PurchaseStage, undo: Option<Compensation>) {
        tracing::debug!(from = %self.stage, to = %stage, "Purchase stage transition");
        self.stage = stage;
        if let Some(undo) = undo {
            self.compensations.push(undo);
        }
        if stage.is_terminal() {
            self.compensations.clear();
        }
    }

    /// Moves to `Failed` for a failure that happened before any state changed.
    ///
    /// Returns `error` unchanged.
    pub fn reject(&mut self, error: BookingError) -> BookingError {
        debug_assert!(self.compensations.is_empty());
        tracing::debug!(stage = %self.stage, error = %error, "Purchase rejected");
        self.stage = PurchaseStage::Failed;
        error
    }

    /// Unwinds every recorded step and moves to `Failed`.
    ///
    /// Returns `error` so callers can write `return Err(saga.fail(...))`.
    pub fn fail(
        &mut self,
        error: BookingError,
        seats: &mut SeatMap,
        account: &mut Account,
        inventory_env: &InventoryEnvironment,
        account_env: &AccountEnvironment,
    ) -> BookingError {
        let failed_at = self.stage;

        while let Some(undo) = self.compensations.pop() {
            match undo {
                Compensation::Refund(amount) => {
                    if let Err(refund_error) = AccountLedger.credit(account, amount, account_env) {
                        tracing::error!(
                            user_id = %account.user_id,
                            amount = %amount,
                            error = %refund_error,
                            "Refund during compensation failed"
                        );
                    }
                }
                Compensation::ReleaseSeats(keys) => {
                    InventoryLedger.release(seats, keys, inventory_env);
                }
            }
        }

        tracing::warn!(stage = %failed_at, error = %error, "Purchase compensated");

        self.stage = PurchaseStage::Failed;
        error
    }
}
