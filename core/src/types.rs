//! Domain types for the box office.
//!
//! Value objects (identifiers, money, seat keys), the per-movie seat map and
//! the entity records for movies, users and tickets.

use crate::error::LayoutError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Catalog identifier of a movie, assigned by the external feed
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(u64);

impl MovieId {
    /// Creates a `MovieId` from its catalog number
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the catalog number
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket
///
/// Ticket ids are minted by a [`TicketIdGenerator`](crate::TicketIdGenerator),
/// never by the ticket itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Create a `TicketId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (smallest currency unit, never negative)
// ============================================================================

/// Represents money in the smallest currency unit
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero money
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Subtracts two money amounts (returns None if result would be negative)
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        if self.0 >= other.0 {
            Some(Self(self.0 - other.0))
        } else {
            None
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Seats
// ============================================================================

/// Identity of a seat: row letter plus seat number.
///
/// Two seats are the same seat iff row and number match. Keys order by row,
/// then by number, which is also the display order of a seat map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatKey {
    /// Row letter
    pub row: char,
    /// Seat number within the row (starting at 1)
    pub number: u32,
}

impl SeatKey {
    /// Creates a seat key
    #[must_use]
    pub const fn new(row: char, number: u32) -> Self {
        Self { row, number }
    }
}

impl fmt::Display for SeatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

/// A seat as seen by callers: its key plus the booked flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Row letter
    pub row: char,
    /// Seat number within the row
    pub number: u32,
    /// Whether a live ticket holds this seat
    pub booked: bool,
}

impl Seat {
    /// Returns the identity of this seat
    #[must_use]
    pub const fn key(&self) -> SeatKey {
        SeatKey::new(self.row, self.number)
    }
}

/// The set of seats a movie is shown with.
///
/// Rectangular theaters and sparse (irregular) layouts are both expressed as
/// an ordered set of keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLayout {
    seats: BTreeSet<SeatKey>,
}

impl SeatLayout {
    /// Highest number of lettered rows (`A` to `Z`)
    pub const MAX_ROWS: u8 = 26;

    /// Builds a `rows` × `seats_per_row` layout with rows lettered from `A`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Empty`] if either dimension is zero and
    /// [`LayoutError::TooManyRows`] past row `Z`.
    pub fn rectangular(rows: u8, seats_per_row: u32) -> Result<Self, LayoutError> {
        if rows == 0 || seats_per_row == 0 {
            return Err(LayoutError::Empty);
        }
        if rows > Self::MAX_ROWS {
            return Err(LayoutError::TooManyRows {
                rows,
                max: Self::MAX_ROWS,
            });
        }

        let seats = (b'A'..b'A' + rows)
            .map(char::from)
            .flat_map(|row| (1..=seats_per_row).map(move |number| SeatKey::new(row, number)))
            .collect();

        Ok(Self { seats })
    }

    /// Builds a layout from an explicit list of seats.
    ///
    /// Duplicate keys collapse into one seat.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Empty`] for an empty list and
    /// [`LayoutError::InvalidSeat`] for a seat numbered 0 or a row that is
    /// not an uppercase ASCII letter.
    pub fn sparse(keys: impl IntoIterator<Item = SeatKey>) -> Result<Self, LayoutError> {
        let mut seats = BTreeSet::new();
        for key in keys {
            if key.number == 0 || !key.row.is_ascii_uppercase() {
                return Err(LayoutError::InvalidSeat(key));
            }
            seats.insert(key);
        }

        if seats.is_empty() {
            return Err(LayoutError::Empty);
        }

        Ok(Self { seats })
    }

    /// Number of seats in the layout
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// A valid layout is never empty; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Whether the layout contains the seat
    #[must_use]
    pub fn contains(&self, key: &SeatKey) -> bool {
        self.seats.contains(key)
    }

    /// Seat keys in row-then-number order
    pub fn keys(&self) -> impl Iterator<Item = SeatKey> + '_ {
        self.seats.iter().copied()
    }
}

/// Booked/free state of every seat of one movie, indexed by seat key.
///
/// Only the inventory ledger mutates a seat map in the engine; everything
/// else reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SeatMapRepr", from = "SeatMapRepr")]
pub struct SeatMap {
    movie_id: MovieId,
    seats: BTreeMap<SeatKey, bool>,
}

// JSON object keys must be strings, so seat maps travel as a seat list.
#[derive(Serialize, Deserialize)]
struct SeatMapRepr {
    movie_id: MovieId,
    seats: Vec<Seat>,
}

impl From<SeatMap> for SeatMapRepr {
    fn from(map: SeatMap) -> Self {
        Self {
            movie_id: map.movie_id,
            seats: map.seats().collect(),
        }
    }
}

impl From<SeatMapRepr> for SeatMap {
    fn from(repr: SeatMapRepr) -> Self {
        Self {
            movie_id: repr.movie_id,
            seats: repr
                .seats
                .into_iter()
                .map(|seat| (seat.key(), seat.booked))
                .collect(),
        }
    }
}

impl SeatMap {
    /// Creates a seat map with every seat of the layout free
    #[must_use]
    pub fn from_layout(movie_id: MovieId, layout: &SeatLayout) -> Self {
        Self {
            movie_id,
            seats: layout.keys().map(|key| (key, false)).collect(),
        }
    }

    /// The movie this seat map belongs to
    #[must_use]
    pub const fn movie_id(&self) -> MovieId {
        self.movie_id
    }

    /// Whether the seat exists on this map
    #[must_use]
    pub fn contains(&self, key: &SeatKey) -> bool {
        self.seats.contains_key(key)
    }

    /// Booked flag of a seat, `None` if the seat does not exist
    #[must_use]
    pub fn is_booked(&self, key: &SeatKey) -> Option<bool> {
        self.seats.get(key).copied()
    }

    /// Sets the booked flag of a seat and returns the previous flag.
    ///
    /// Returns `None` (and changes nothing) if the seat does not exist.
    pub fn mark(&mut self, key: SeatKey, booked: bool) -> Option<bool> {
        self.seats
            .get_mut(&key)
            .map(|flag| std::mem::replace(flag, booked))
    }

    /// Total number of seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether the map has no seats at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Number of free seats
    #[must_use]
    pub fn available(&self) -> usize {
        self.seats.values().filter(|booked| !**booked).count()
    }

    /// Keys of all booked seats
    #[must_use]
    pub fn booked_keys(&self) -> BTreeSet<SeatKey> {
        self.seats
            .iter()
            .filter(|(_, booked)| **booked)
            .map(|(key, _)| *key)
            .collect()
    }

    /// All seats in layout order
    pub fn seats(&self) -> impl Iterator<Item = Seat> + '_ {
        self.seats.iter().map(|(key, booked)| Seat {
            row: key.row,
            number: key.number,
            booked: *booked,
        })
    }
}

// ============================================================================
// Movies
// ============================================================================

/// Catalog metadata of a movie. Read-only once the catalog is loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieInfo {
    /// Catalog identifier
    pub id: MovieId,
    /// Title
    pub title: String,
    /// Synopsis
    pub description: String,
    /// Release date as published by the feed
    pub release_date: String,
    /// Minimum viewer age
    pub age_rating: u32,
    /// Price of one seat
    pub ticket_price: Money,
    /// Poster image URL
    pub poster_url: String,
}

/// A movie together with the seat map it exclusively owns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// Catalog metadata
    pub info: MovieInfo,
    /// Seat state
    pub seats: SeatMap,
}

impl Movie {
    /// Creates a movie with every seat of `layout` free
    #[must_use]
    pub fn new(info: MovieInfo, layout: &SeatLayout) -> Self {
        let seats = SeatMap::from_layout(info.id, layout);
        Self { info, seats }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Registration input. The password arrives already hashed by the auth layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Login name, unique across users
    pub username: String,
    /// Password hash produced by the auth layer
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Age in years
    pub age: u32,
}

/// Immutable part of a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Password hash (never serialized out)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Age in years
    pub age: u32,
    /// When the user registered
    pub created_at: DateTime<Utc>,
}

/// Mutable part of a user: the balance and the tickets they own.
///
/// The balance only changes through the account ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owner
    pub user_id: UserId,
    /// Current balance
    pub balance: Money,
    /// Live tickets in purchase order
    pub tickets: Vec<TicketId>,
    /// Last balance or ticket change
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Opens an empty account
    #[must_use]
    pub const fn new(user_id: UserId, opened_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            balance: Money::ZERO,
            tickets: Vec::new(),
            updated_at: opened_at,
        }
    }

    /// Records ownership of a ticket
    pub fn attach_ticket(&mut self, ticket_id: TicketId) {
        self.tickets.push(ticket_id);
    }

    /// Drops ownership of a ticket, returning whether it was owned
    pub fn detach_ticket(&mut self, ticket_id: &TicketId) -> bool {
        let before = self.tickets.len();
        self.tickets.retain(|id| id != ticket_id);
        self.tickets.len() != before
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// A committed purchase. Immutable until deleted by a cancellation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier
    pub id: TicketId,
    /// Buyer
    pub user_id: UserId,
    /// Movie the seats belong to
    pub movie_id: MovieId,
    /// Purchased seats in request order
    pub seats: Vec<SeatKey>,
    /// Price × seat count at purchase time
    pub cost: Money,
    /// When the ticket was committed
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at`; tickets are never updated in place
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Number of seats on the ticket
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn money_display_and_arithmetic() {
        assert_eq!(Money::from_cents(100_050).to_string(), "1000.50");
        assert_eq!(
            Money::from_cents(1000).checked_multiply(2),
            Some(Money::from_cents(2000))
        );
        assert_eq!(
            Money::from_cents(500).checked_sub(Money::from_cents(1000)),
            None
        );
        assert_eq!(Money::from_cents(u64::MAX).checked_add(Money::from_cents(1)), None);
        assert!(Money::ZERO.is_zero());
    }

    #[test]
    fn seat_keys_order_by_row_then_number() {
        let mut keys = vec![
            SeatKey::new('B', 1),
            SeatKey::new('A', 10),
            SeatKey::new('A', 2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SeatKey::new('A', 2),
                SeatKey::new('A', 10),
                SeatKey::new('B', 1)
            ]
        );
        assert_eq!(SeatKey::new('C', 7).to_string(), "C7");
    }

    #[test]
    fn seat_key_json_shape() {
        let key: SeatKey = serde_json::from_str(r#"{"row":"A","number":1}"#).unwrap();
        assert_eq!(key, SeatKey::new('A', 1));
    }

    #[test]
    fn rectangular_layout_covers_every_seat() {
        let layout = SeatLayout::rectangular(8, 8).unwrap();
        assert_eq!(layout.len(), 64);
        assert_eq!(layout.keys().next(), Some(SeatKey::new('A', 1)));
        assert_eq!(layout.keys().last(), Some(SeatKey::new('H', 8)));
        assert!(!layout.contains(&SeatKey::new('I', 1)));
        assert!(!layout.contains(&SeatKey::new('A', 9)));
    }

    #[test]
    fn rectangular_layout_rejects_bad_dimensions() {
        assert_eq!(SeatLayout::rectangular(0, 8), Err(LayoutError::Empty));
        assert_eq!(SeatLayout::rectangular(8, 0), Err(LayoutError::Empty));
        assert_eq!(
            SeatLayout::rectangular(27, 8),
            Err(LayoutError::TooManyRows { rows: 27, max: 26 })
        );
    }

    #[test]
    fn sparse_layout_validates_seats() {
        let layout = SeatLayout::sparse([
            SeatKey::new('A', 3),
            SeatKey::new('A', 3),
            SeatKey::new('C', 1),
        ])
        .unwrap();
        assert_eq!(layout.len(), 2);

        assert_eq!(
            SeatLayout::sparse([SeatKey::new('A', 0)]),
            Err(LayoutError::InvalidSeat(SeatKey::new('A', 0)))
        );
        assert_eq!(
            SeatLayout::sparse([SeatKey::new('a', 1)]),
            Err(LayoutError::InvalidSeat(SeatKey::new('a', 1)))
        );
        assert_eq!(
            SeatLayout::sparse(Vec::<SeatKey>::new()),
            Err(LayoutError::Empty)
        );
    }

    #[test]
    fn seat_map_mark_reports_previous_flag() {
        let layout = SeatLayout::rectangular(2, 2).unwrap();
        let mut map = SeatMap::from_layout(MovieId::new(7), &layout);

        assert_eq!(map.mark(SeatKey::new('A', 1), true), Some(false));
        assert_eq!(map.mark(SeatKey::new('A', 1), true), Some(true));
        assert_eq!(map.mark(SeatKey::new('Z', 1), true), None);

        assert_eq!(map.available(), 3);
        assert_eq!(
            map.booked_keys().into_iter().collect::<Vec<_>>(),
            vec![SeatKey::new('A', 1)]
        );
        let seats: Vec<Seat> = map.seats().collect();
        assert_eq!(seats.len(), 4);
        assert!(seats[0].booked);
        assert_eq!(seats[3].key(), SeatKey::new('B', 2));
    }

    #[test]
    fn account_ticket_index() {
        let user_id = UserId::new();
        let mut account = Account::new(user_id, Utc::now());
        let first = TicketId::from_uuid(Uuid::from_u128(1));
        let second = TicketId::from_uuid(Uuid::from_u128(2));

        account.attach_ticket(first);
        account.attach_ticket(second);
        assert!(account.detach_ticket(&first));
        assert!(!account.detach_ticket(&first));
        assert_eq!(account.tickets, vec![second]);
    }

    #[test]
    fn seat_map_serializes_as_seat_list() {
        let layout = SeatLayout::rectangular(1, 2).unwrap();
        let mut map = SeatMap::from_layout(MovieId::new(3), &layout);
        map.mark(SeatKey::new('A', 2), true);

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "movie_id": 3,
                "seats": [
                    {"row": "A", "number": 1, "booked": false},
                    {"row": "A", "number": 2, "booked": true}
                ]
            })
        );
        let back: SeatMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sub_undoes_add(a in 0..u64::MAX / 2, b in 0..u64::MAX / 2) {
                let a = Money::from_cents(a);
                let b = Money::from_cents(b);
                prop_assert_eq!(a.checked_add(b).and_then(|sum| sum.checked_sub(b)), Some(a));
            }

            #[test]
            fn sub_never_goes_negative(a: u64, b: u64) {
                let result = Money::from_cents(a).checked_sub(Money::from_cents(b));
                prop_assert_eq!(result.is_some(), a >= b);
            }

            #[test]
            fn multiply_matches_repeated_add(price in 0..1_000_000u64, count in 0..7u32) {
                let price = Money::from_cents(price);
                let added = (0..count).try_fold(Money::ZERO, |sum, _| sum.checked_add(price));
                prop_assert_eq!(price.checked_multiply(count), added);
            }
        }
    }
}
