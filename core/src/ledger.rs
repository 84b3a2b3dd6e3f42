//! The ledger trait - validate a command, then apply the resulting event.
//!
//! Every component that owns mutable booking state (seat maps, accounts)
//! is a ledger. A ledger splits a state change in two:
//!
//! 1. [`Ledger::decide`] inspects the state and the whole command and either
//!    rejects it or describes the change as an event. It never mutates.
//! 2. [`Ledger::apply`] writes the event into the state. It cannot fail.
//!
//! Because rejection happens before the first write, a rejected command
//! leaves no partial effects behind. This is what makes a batch seat
//! reservation all-or-nothing.
//!
//! # Example
//!
//! ```ignore
//! impl Ledger for AccountLedger {
//!     type State = Account;
//!     type Command = AccountCommand;
//!     type Event = AccountEvent;
//!     type Environment = AccountEnvironment;
//!
//!     fn decide(&self, state: &Account, command: AccountCommand, env: &AccountEnvironment)
//!         -> Result<AccountEvent, BookingError>
//!     {
//!         // validation only
//!     }
//!
//!     fn apply(&self, state: &mut Account, event: &AccountEvent) {
//!         // mutation only
//!     }
//! }
//! ```

use crate::error::BookingError;

/// A state owner that validates commands before applying their events
pub trait Ledger {
    /// The state this ledger guards
    type State;

    /// Requests to change the state
    type Command;

    /// Facts describing an accepted change
    type Event;

    /// Injected dependencies (clock, limits)
    type Environment;

    /// Validates `command` against `state` and describes the change.
    ///
    /// # Errors
    ///
    /// Returns the business-rule violation that rejects the command.
    fn decide(
        &self,
        state: &Self::State,
        command: Self::Command,
        env: &Self::Environment,
    ) -> Result<Self::Event, BookingError>;

    /// Writes an accepted event into the state
    fn apply(&self, state: &mut Self::State, event: &Self::Event);

    /// Decides and, on success, applies.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Ledger::decide`]; the state is then untouched.
    fn execute(
        &self,
        state: &mut Self::State,
        command: Self::Command,
        env: &Self::Environment,
    ) -> Result<Self::Event, BookingError> {
        let event = self.decide(state, command, env)?;
        self.apply(state, &event);
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Money;

    struct CounterLedger;

    impl Ledger for CounterLedger {
        type State = u64;
        type Command = u64;
        type Event = u64;
        type Environment = u64;

        fn decide(&self, state: &u64, command: u64, env: &u64) -> Result<u64, BookingError> {
            if state + command > *env {
                return Err(BookingError::InsufficientBalance {
                    balance: Money::from_cents(*state),
                    required: Money::from_cents(command),
                });
            }
            Ok(command)
        }

        fn apply(&self, state: &mut u64, event: &u64) {
            *state += event;
        }
    }

    #[test]
    fn execute_applies_accepted_events() {
        let mut state = 1;
        let event = CounterLedger.execute(&mut state, 2, &10);
        assert_eq!(event, Ok(2));
        assert_eq!(state, 3);
    }

    #[test]
    fn execute_leaves_state_untouched_on_rejection() {
        let mut state = 9;
        let result = CounterLedger.execute(&mut state, 5, &10);
        assert!(result.is_err());
        assert_eq!(state, 9);
    }
}
