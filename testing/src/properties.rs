//! proptest strategies for domain types.

use crate::fixtures::{ROWS, SEATS_PER_ROW};
use boxoffice_core::{Money, SeatKey};
use proptest::prelude::*;

/// Any seat of the standard 8×8 layout
pub fn arb_seat() -> impl Strategy<Value = SeatKey> {
    (0..ROWS, 1..=SEATS_PER_ROW).prop_map(|(row, number)| SeatKey::new(char::from(b'A' + row), number))
}

/// A seat that is not part of the standard layout
pub fn arb_unknown_seat() -> impl Strategy<Value = SeatKey> {
    prop_oneof![
        (1..=SEATS_PER_ROW).prop_map(|number| SeatKey::new('Z', number)),
        (SEATS_PER_ROW + 1..100).prop_map(|number| SeatKey::new('A', number)),
        Just(SeatKey::new('A', 0)),
    ]
}

/// A request of up to `max` seats from the standard layout, duplicates possible
pub fn arb_seat_request(max: usize) -> impl Strategy<Value = Vec<SeatKey>> {
    prop::collection::vec(arb_seat(), 0..=max)
}

/// Up to `max` distinct seats from the standard layout
pub fn arb_distinct_seats(max: usize) -> impl Strategy<Value = Vec<SeatKey>> {
    prop::collection::btree_set(arb_seat(), 1..=max).prop_map(|set| set.into_iter().collect())
}

/// Balances up to 1,000,000.00
pub fn arb_balance() -> impl Strategy<Value = Money> {
    (0..100_000_000u64).prop_map(Money::from_cents)
}

/// Positive amounts up to 10,000.00
pub fn arb_amount() -> impl Strategy<Value = Money> {
    (1..1_000_000u64).prop_map(Money::from_cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::standard_layout;

    proptest! {
        #[test]
        fn seats_are_in_layout(seat in arb_seat()) {
            prop_assert!(standard_layout().contains(&seat));
        }

        #[test]
        fn unknown_seats_are_not(seat in arb_unknown_seat()) {
            prop_assert!(!standard_layout().contains(&seat));
        }

        #[test]
        fn distinct_seats_have_no_repeats(seats in arb_distinct_seats(6)) {
            let mut sorted = seats.clone();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), seats.len());
        }
    }
}
