//! Movie and user registries.
//!
//! Movies are fixed once the catalog is loaded, so their registry is a plain
//! map. Users arrive at runtime and sit behind a read-write lock; each user's
//! account has its own mutex so balance operations on different users never
//! contend.

use boxoffice_core::{
    Account, BookingError, Movie, MovieId, MovieInfo, NewUser, Resource, SeatMap, UserId,
    UserProfile,
};
use chrono::{DateTime, Utc};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A movie's read-only metadata and its locked seat map
#[derive(Debug)]
pub struct MovieEntry {
    /// Catalog metadata
    pub info: MovieInfo,
    /// Seat state; one lock per movie
    pub seats: Mutex<SeatMap>,
}

/// A user's immutable profile and locked account
#[derive(Debug)]
pub struct UserEntry {
    /// Registration data
    pub profile: UserProfile,
    /// Balance and owned tickets; one lock per user
    pub account: Mutex<Account>,
}

/// Movies by id
#[derive(Debug, Default)]
pub struct MovieRegistry {
    movies: BTreeMap<MovieId, Arc<MovieEntry>>,
}

impl MovieRegistry {
    /// Builds the registry from catalog movies; a repeated id is skipped with a warning
    #[must_use]
    pub fn new(movies: impl IntoIterator<Item = Movie>) -> Self {
        let mut registry = BTreeMap::new();
        for movie in movies {
            match registry.entry(movie.info.id) {
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(MovieEntry {
                        info: movie.info,
                        seats: Mutex::new(movie.seats),
                    }));
                }
                Entry::Occupied(_) => {
                    tracing::warn!(
                        movie_id = %movie.info.id,
                        title = %movie.info.title,
                        "Duplicate movie id, keeping the first"
                    );
                }
            }
        }
        Self { movies: registry }
    }

    /// Looks up a movie.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] for unknown ids.
    pub fn get(&self, id: MovieId) -> Result<Arc<MovieEntry>, BookingError> {
        self.movies
            .get(&id)
            .cloned()
            .ok_or(BookingError::NotFound(Resource::Movie(id)))
    }

    /// All movies in id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MovieEntry>> {
        self.movies.values()
    }

    /// Number of movies
    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    /// Whether there are no movies
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, Arc<UserEntry>>,
    by_username: HashMap<String, UserId>,
}

/// Users by id and by username
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<Users>,
}

impl UserRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with a zero balance.
    ///
    /// # Errors
    ///
    /// [`BookingError::UsernameTaken`] if the username is in use.
    pub async fn register(
        &self,
        new_user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<Arc<UserEntry>, BookingError> {
        let mut users = self.users.write().await;
        if users.by_username.contains_key(&new_user.username) {
            return Err(BookingError::UsernameTaken(new_user.username));
        }

        let id = UserId::new();
        let profile = UserProfile {
            id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            name: new_user.name,
            age: new_user.age,
            created_at: now,
        };
        let entry = Arc::new(UserEntry {
            account: Mutex::new(Account::new(id, now)),
            profile,
        });

        users.by_username.insert(entry.profile.username.clone(), id);
        users.by_id.insert(id, Arc::clone(&entry));
        Ok(entry)
    }

    /// Looks up a user by id.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] for unknown ids.
    pub async fn get(&self, id: UserId) -> Result<Arc<UserEntry>, BookingError> {
        self.users
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or(BookingError::NotFound(Resource::User(id)))
    }

    /// Looks up a user by username.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] for unknown usernames.
    pub async fn by_username(&self, username: &str) -> Result<Arc<UserEntry>, BookingError> {
        let users = self.users.read().await;
        users
            .by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned()
            .ok_or_else(|| BookingError::NotFound(Resource::Username(username.to_string())))
    }

    /// Number of registered users
    pub async fn len(&self) -> usize {
        self.users.read().await.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use boxoffice_core::{Money, SeatLayout};

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            name: "Test".to_string(),
            age: 20,
        }
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let registry = UserRegistry::new();
        let alice = registry.register(new_user("alice"), Utc::now()).await.unwrap();

        let again = registry.register(new_user("alice"), Utc::now()).await;
        assert_eq!(again.unwrap_err(), BookingError::UsernameTaken("alice".into()));

        let found = registry.by_username("alice").await.unwrap();
        assert_eq!(found.profile.id, alice.profile.id);
        assert_eq!(registry.len().await, 1);
        assert_eq!(alice.account.lock().await.balance, Money::ZERO);
    }

    #[tokio::test]
    async fn unknown_users_are_not_found() {
        let registry = UserRegistry::new();
        let id = UserId::new();
        assert_eq!(
            registry.get(id).await.unwrap_err(),
            BookingError::NotFound(Resource::User(id))
        );
        assert!(matches!(
            registry.by_username("nobody").await,
            Err(BookingError::NotFound(Resource::Username(_)))
        ));
    }

    #[test]
    fn movies_are_indexed_by_id() {
        let layout = SeatLayout::rectangular(1, 3).unwrap();
        let info = MovieInfo {
            id: MovieId::new(4),
            title: "Dune".to_string(),
            description: String::new(),
            release_date: String::new(),
            age_rating: 13,
            ticket_price: Money::from_cents(900),
            poster_url: String::new(),
        };
        let registry = MovieRegistry::new([Movie::new(info, &layout)]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(MovieId::new(4)).unwrap().info.title, "Dune");
        assert_eq!(
            registry.get(MovieId::new(5)).unwrap_err(),
            BookingError::NotFound(Resource::Movie(MovieId::new(5)))
        );
    }

    #[test]
    fn repeated_movie_id_keeps_first() {
        let layout = SeatLayout::rectangular(2, 2).unwrap();
        let movie = |title: &str, cents| {
            let info = MovieInfo {
                id: MovieId::new(8),
                title: title.to_string(),
                description: String::new(),
                release_date: String::new(),
                age_rating: 0,
                ticket_price: Money::from_cents(cents),
                poster_url: String::new(),
            };
            Movie::new(info, &layout)
        };

        let registry = MovieRegistry::new([movie("Heat", 800), movie("Heat (re-release)", 1200)]);

        assert_eq!(registry.len(), 1);
        let entry = registry.get(MovieId::new(8)).unwrap();
        assert_eq!(entry.info.title, "Heat");
        assert_eq!(entry.info.ticket_price, Money::from_cents(800));
    }
}
