//! Fixtures for movies, seats and users.

use boxoffice_core::{Money, Movie, MovieId, MovieInfo, NewUser, SeatKey, SeatLayout};

/// Rows of the standard test auditorium
pub const ROWS: u8 = 8;

/// Seats per row of the standard test auditorium
pub const SEATS_PER_ROW: u32 = 8;

/// Shorthand for a seat key
#[must_use]
pub const fn seat(row: char, number: u32) -> SeatKey {
    SeatKey::new(row, number)
}

/// Parses labels like `"A1"` into seat keys.
///
/// # Panics
///
/// Panics on a label that is not a row letter followed by a number.
#[must_use]
#[allow(clippy::panic)]
pub fn seats(labels: &[&str]) -> Vec<SeatKey> {
    labels
        .iter()
        .map(|label| {
            let mut chars = label.chars();
            let row = chars
                .next()
                .unwrap_or_else(|| panic!("empty seat label"));
            let number = chars
                .as_str()
                .parse()
                .unwrap_or_else(|_| panic!("bad seat label {label}"));
            SeatKey::new(row, number)
        })
        .collect()
}

/// The 8×8 auditorium, rows A-H
///
/// # Panics
///
/// Never; the dimensions are valid.
#[must_use]
#[allow(clippy::expect_used)]
pub fn standard_layout() -> SeatLayout {
    SeatLayout::rectangular(ROWS, SEATS_PER_ROW).expect("8x8 layout is valid")
}

/// Builder for test movies
#[derive(Clone, Debug)]
pub struct MovieBuilder {
    info: MovieInfo,
    layout: Option<SeatLayout>,
}

impl MovieBuilder {
    /// A 15+ movie priced 10.00 on the standard layout
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            info: MovieInfo {
                id: MovieId::new(id),
                title: format!("Movie {id}"),
                description: String::new(),
                release_date: "2023-05-17".to_string(),
                age_rating: 15,
                ticket_price: Money::from_cents(1000),
                poster_url: String::new(),
            },
            layout: None,
        }
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.info.title = title.to_string();
        self
    }

    /// Set the seat price in cents
    #[must_use]
    pub const fn price(mut self, cents: u64) -> Self {
        self.info.ticket_price = Money::from_cents(cents);
        self
    }

    /// Set the minimum viewer age
    #[must_use]
    pub const fn age_rating(mut self, rating: u32) -> Self {
        self.info.age_rating = rating;
        self
    }

    /// Use a non-standard layout
    #[must_use]
    pub fn layout(mut self, layout: SeatLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Build the movie with every seat free
    #[must_use]
    pub fn build(self) -> Movie {
        let layout = self.layout.unwrap_or_else(standard_layout);
        Movie::new(self.info, &layout)
    }
}

/// Registration input for a user of the given age
#[must_use]
pub fn new_user(username: &str, age: u32) -> NewUser {
    NewUser {
        username: username.to_string(),
        password_hash: format!("$2b$12${username}"),
        name: username.to_string(),
        age,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse() {
        assert_eq!(seats(&["A1", "H8"]), vec![seat('A', 1), seat('H', 8)]);
    }

    #[test]
    fn builder_defaults() {
        let movie = MovieBuilder::new(4).price(250).age_rating(18).build();
        assert_eq!(movie.info.id, MovieId::new(4));
        assert_eq!(movie.info.ticket_price, Money::from_cents(250));
        assert_eq!(movie.seats.available(), 64);
    }
}
