//! Account ledger: debits and credits on one user's balance.
//!
//! The balance is a `Money` (unsigned), and a debit larger than the balance
//! is rejected before anything changes, so a balance can never go negative.

use boxoffice_core::{Account, BookingError, Clock, Ledger, Money, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Checks a caller-supplied amount.
///
/// Zero is allowed and leaves the balance unchanged.
///
/// # Errors
///
/// [`BookingError::InvalidAmount`] for negative amounts.
pub fn validate_amount(amount: i64) -> Result<Money, BookingError> {
    u64::try_from(amount)
        .map(Money::from_cents)
        .map_err(|_| BookingError::InvalidAmount(amount))
}

/// Environment dependencies for the account ledger
#[derive(Clone)]
pub struct AccountEnvironment {
    /// Clock for event timestamps
    pub clock: Arc<dyn Clock>,
}

impl AccountEnvironment {
    /// Creates a new `AccountEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Balance changes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCommand {
    /// Take money out (purchase, withdrawal)
    Debit {
        /// Amount to take
        amount: Money,
    },
    /// Put money in (top-up, refund)
    Credit {
        /// Amount to add
        amount: Money,
    },
}

/// Accepted balance changes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    /// Money left the account
    Debited {
        /// Account owner
        user_id: UserId,
        /// Amount taken
        amount: Money,
        /// Balance after the debit
        balance: Money,
        /// When it happened
        at: DateTime<Utc>,
    },
    /// Money entered the account
    Credited {
        /// Account owner
        user_id: UserId,
        /// Amount added
        amount: Money,
        /// Balance after the credit
        balance: Money,
        /// When it happened
        at: DateTime<Utc>,
    },
}

impl AccountEvent {
    /// Balance after the event
    #[must_use]
    pub const fn balance(&self) -> Money {
        match self {
            Self::Debited { balance, .. } | Self::Credited { balance, .. } => *balance,
        }
    }
}

/// Ledger guarding one user's [`Account`]
#[derive(Clone, Copy, Debug, Default)]
pub struct AccountLedger;

impl AccountLedger {
    /// Creates a new `AccountLedger`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Takes `amount` from the account and returns the new balance.
    ///
    /// # Errors
    ///
    /// [`BookingError::InsufficientBalance`] if `amount` exceeds the balance;
    /// the account is then unchanged.
    pub fn debit(
        &self,
        account: &mut Account,
        amount: Money,
        env: &AccountEnvironment,
    ) -> Result<Money, BookingError> {
        self.execute(account, AccountCommand::Debit { amount }, env)
            .map(|event| event.balance())
    }

    /// Adds `amount` to the account and returns the new balance.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidAmount`] if the balance would overflow.
    pub fn credit(
        &self,
        account: &mut Account,
        amount: Money,
        env: &AccountEnvironment,
    ) -> Result<Money, BookingError> {
        self.execute(account, AccountCommand::Credit { amount }, env)
            .map(|event| event.balance())
    }
}

impl Ledger for AccountLedger {
    type State = Account;
    type Command = AccountCommand;
    type Event = AccountEvent;
    type Environment = AccountEnvironment;

    fn decide(
        &self,
        state: &Account,
        command: AccountCommand,
        env: &AccountEnvironment,
    ) -> Result<AccountEvent, BookingError> {
        match command {
            AccountCommand::Debit { amount } => {
                let balance = state.balance.checked_sub(amount).ok_or(
                    BookingError::InsufficientBalance {
                        balance: state.balance,
                        required: amount,
                    },
                )?;
                Ok(AccountEvent::Debited {
                    user_id: state.user_id,
                    amount,
                    balance,
                    at: env.clock.now(),
                })
            }
            AccountCommand::Credit { amount } => {
                let balance = state.balance.checked_add(amount).ok_or_else(|| {
                    BookingError::InvalidAmount(i64::try_from(amount.cents()).unwrap_or(i64::MAX))
                })?;
                Ok(AccountEvent::Credited {
                    user_id: state.user_id,
                    amount,
                    balance,
                    at: env.clock.now(),
                })
            }
        }
    }

    fn apply(&self, state: &mut Account, event: &AccountEvent) {
        let (AccountEvent::Debited { balance, at, .. } | AccountEvent::Credited { balance, at, .. }) =
            *event;
        state.balance = balance;
        state.updated_at = at;
    }
}
