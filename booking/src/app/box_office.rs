//! The booking orchestrator.
//!
//! [`BoxOffice`] composes the inventory ledger, the account ledger and the
//! ticket store into purchase and cancellation. Both hold the movie lock and
//! then the user lock for their whole critical section, so no reader ever sees
//! seats booked without a ticket or a ticket without its debit.

use super::locking::acquire;
use super::registry::{MovieEntry, MovieRegistry, UserEntry, UserRegistry};
use super::saga::{Compensation, PurchaseSaga, PurchaseStage};
use crate::aggregates::{
    AccountCommand, AccountEnvironment, AccountLedger, InMemoryTicketStore,
    InventoryEnvironment, InventoryLedger, validate_amount,
};
use crate::catalog::Catalog;
use crate::config::BookingConfig;
use crate::events::{BookingEvent, EventFeed};
use crate::metrics;
use boxoffice_core::{
    BookingError, Clock, Ledger, Money, Movie, MovieId, MovieInfo, NewUser, Resource, SeatKey,
    SystemClock, Ticket, TicketId, TicketIdGenerator, TicketStore, UserId, UserProfile,
    UuidTicketIds,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// A user as callers see it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    /// Registration data
    pub profile: UserProfile,
    /// Current balance
    pub balance: Money,
    /// Live tickets in purchase order
    pub tickets: Vec<TicketId>,
}

/// One catalog line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
    /// Catalog metadata
    pub info: MovieInfo,
    /// Seats in the layout
    pub total_seats: usize,
    /// Seats still free
    pub available_seats: usize,
}

/// Seat-reservation and balance-settlement engine.
///
/// Share it between tasks as `Arc<BoxOffice>`.
pub struct BoxOffice {
    movies: MovieRegistry,
    users: UserRegistry,
    tickets: Arc<dyn TicketStore>,
    ticket_ids: Arc<dyn TicketIdGenerator>,
    clock: Arc<dyn Clock>,
    inventory_env: InventoryEnvironment,
    account_env: AccountEnvironment,
    lock_timeout: Duration,
    feed: EventFeed,
}

impl std::fmt::Debug for BoxOffice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxOffice")
            .field("movies", &self.movies.len())
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BoxOffice`]
pub struct BoxOfficeBuilder {
    movies: Vec<Movie>,
    clock: Arc<dyn Clock>,
    ticket_ids: Arc<dyn TicketIdGenerator>,
    tickets: Arc<dyn TicketStore>,
    config: BookingConfig,
}

impl BoxOfficeBuilder {
    /// Adds movies
    #[must_use]
    pub fn movies(mut self, movies: impl IntoIterator<Item = Movie>) -> Self {
        self.movies.extend(movies);
        self
    }

    /// Adds every movie of a loaded catalog
    #[must_use]
    pub fn catalog(self, catalog: Catalog) -> Self {
        self.movies(catalog.into_movies())
    }

    /// Replaces the clock (default: system time)
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the ticket id generator (default: random uuids)
    #[must_use]
    pub fn ticket_ids(mut self, ticket_ids: Arc<dyn TicketIdGenerator>) -> Self {
        self.ticket_ids = ticket_ids;
        self
    }

    /// Replaces the ticket store (default: in memory)
    #[must_use]
    pub fn ticket_store(mut self, tickets: Arc<dyn TicketStore>) -> Self {
        self.tickets = tickets;
        self
    }

    /// Applies limits and timeouts
    #[must_use]
    pub fn config(mut self, config: BookingConfig) -> Self {
        self.config = config;
        self
    }

    /// Finishes the box office
    #[must_use]
    pub fn build(self) -> BoxOffice {
        let movies = MovieRegistry::new(self.movies);
        for movie in movies.iter() {
            if let Ok(seats) = movie.seats.try_lock() {
                metrics::record_seats_available(movie.info.id, seats.available());
            }
        }

        tracing::info!(
            movies = movies.len(),
            max_seats_per_purchase = self.config.max_seats_per_purchase,
            lock_timeout_ms = self.config.lock_timeout_ms,
            "Box office ready"
        );

        BoxOffice {
            inventory_env: InventoryEnvironment::new(Arc::clone(&self.clock))
                .with_max_seats(self.config.max_seats_per_purchase),
            account_env: AccountEnvironment::new(Arc::clone(&self.clock)),
            lock_timeout: self.config.lock_timeout(),
            feed: EventFeed::new(self.config.event_feed_capacity),
            movies,
            users: UserRegistry::new(),
            tickets: self.tickets,
            ticket_ids: self.ticket_ids,
            clock: self.clock,
        }
    }
}

impl BoxOffice {
    /// Starts a builder with system time, random ticket ids, an in-memory
    /// ticket store and default limits
    #[must_use]
    pub fn builder() -> BoxOfficeBuilder {
        BoxOfficeBuilder {
            movies: Vec::new(),
            clock: Arc::new(SystemClock),
            ticket_ids: Arc::new(UuidTicketIds),
            tickets: Arc::new(InMemoryTicketStore::new()),
            config: BookingConfig::default(),
        }
    }

    // ========================================================================
    // Purchase
    // ========================================================================

    /// Buys `seats` of a movie for a user.
    ///
    /// Either every step commits (seats booked, cost debited, ticket stored)
    /// or every completed step is undone before the error is returned.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown user or movie
    /// - `AgeRestricted` when the movie's rating exceeds the user's age
    /// - `NoSeatsRequested`, `LimitExceeded`, `SeatUnknown`, `SeatUnavailable`
    /// - `InsufficientBalance` when the balance does not cover the cost
    /// - `Busy` when a lock is not acquired in time
    /// - `Internal` when the ticket cannot be stored
    #[tracing::instrument(skip(self, seats), fields(%user_id, %movie_id, requested = seats.len()))]
    pub async fn purchase_ticket(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        seats: Vec<SeatKey>,
    ) -> Result<Ticket, BookingError> {
        let result = self.run_purchase(user_id, movie_id, seats).await;
        match &result {
            Ok(ticket) => {
                metrics::record_purchase(ticket.seat_count(), ticket.cost);
                tracing::info!(
                    ticket_id = %ticket.id,
                    seats = ticket.seat_count(),
                    cost = %ticket.cost,
                    "Ticket purchased"
                );
                self.feed.publish(BookingEvent::TicketPurchased {
                    ticket_id: ticket.id,
                    user_id: ticket.user_id,
                    movie_id: ticket.movie_id,
                    seats: ticket.seats.clone(),
                    cost: ticket.cost,
                    at: ticket.created_at,
                });
            }
            Err(error) => {
                metrics::record_purchase_failure(error.kind());
                tracing::warn!(error = %error, kind = %error.kind(), "Purchase failed");
            }
        }
        result
    }

    async fn run_purchase(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        seats: Vec<SeatKey>,
    ) -> Result<Ticket, BookingError> {
        let mut saga = PurchaseSaga::new();

        let movie = self.movies.get(movie_id).map_err(|e| saga.reject(e))?;
        let user = self.users.get(user_id).await.map_err(|e| saga.reject(e))?;

        // rating and age never change, so no lock is needed for this check
        if movie.info.age_rating > user.profile.age {
            return Err(saga.reject(BookingError::AgeRestricted {
                rating: movie.info.age_rating,
                age: user.profile.age,
            }));
        }
        saga.advance(PurchaseStage::AgeChecked, None);

        let mut seat_map = acquire(&movie.seats, Resource::Movie(movie_id), self.lock_timeout)
            .await
            .map_err(|e| saga.reject(e))?;
        let mut account = acquire(&user.account, Resource::User(user_id), self.lock_timeout)
            .await
            .map_err(|e| saga.reject(e))?;

        let reserved = InventoryLedger
            .reserve(&mut seat_map, seats, &self.inventory_env)
            .map_err(|e| saga.reject(e))?;
        saga.advance(
            PurchaseStage::SeatsReserved,
            Some(Compensation::ReleaseSeats(reserved.clone())),
        );

        let Some(cost) = u32::try_from(reserved.len())
            .ok()
            .and_then(|count| movie.info.ticket_price.checked_multiply(count))
        else {
            return Err(saga.fail(
                BookingError::Internal("ticket cost overflows".to_string()),
                &mut seat_map,
                &mut account,
                &self.inventory_env,
                &self.account_env,
            ));
        };

        if let Err(error) = AccountLedger.debit(&mut account, cost, &self.account_env) {
            return Err(saga.fail(
                error,
                &mut seat_map,
                &mut account,
                &self.inventory_env,
                &self.account_env,
            ));
        }
        saga.advance(PurchaseStage::BalanceDebited, Some(Compensation::Refund(cost)));

        let now = self.clock.now();
        let ticket = Ticket {
            id: self.ticket_ids.next_ticket_id(),
            user_id,
            movie_id,
            seats: reserved,
            cost,
            created_at: now,
            updated_at: now,
        };

        if let Err(error) = self.tickets.create(ticket.clone()).await {
            let error = match error {
                BookingError::DuplicateId(id) => {
                    BookingError::Internal(format!("ticket id {id} is already in use"))
                }
                other => other,
            };
            return Err(saga.fail(
                error,
                &mut seat_map,
                &mut account,
                &self.inventory_env,
                &self.account_env,
            ));
        }

        account.attach_ticket(ticket.id);
        saga.advance(PurchaseStage::TicketCommitted, None);

        let available = seat_map.available();
        drop(account);
        drop(seat_map);
        metrics::record_seats_available(movie_id, available);

        Ok(ticket)
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancels a ticket: frees its seats, refunds its cost and deletes it.
    ///
    /// A ticket owned by another user is reported as `NotFound`. The refund
    /// is validated before the seats are touched, so a refund that cannot be
    /// credited leaves everything as it was. Once the seats are released they
    /// stay released: if the store then fails to delete the ticket, the
    /// refund stands, the ticket is detached from its owner so it can never
    /// be cancelled twice, and the store error is returned.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown, foreign or already cancelled ticket
    /// - `Busy` when a lock is not acquired in time
    /// - `InvalidAmount` if the refund would overflow the balance
    /// - the store's error if the ticket cannot be deleted
    #[tracing::instrument(skip(self), fields(%user_id, %ticket_id))]
    pub async fn cancel_ticket(
        &self,
        user_id: UserId,
        ticket_id: TicketId,
    ) -> Result<Ticket, BookingError> {
        let ticket = self.tickets.read(ticket_id).await?;
        if ticket.user_id != user_id {
            tracing::warn!(owner = %ticket.user_id, "Cancellation of a foreign ticket");
            return Err(BookingError::NotFound(Resource::Ticket(ticket_id)));
        }

        let movie = self.movies.get(ticket.movie_id)?;
        let user = self.users.get(user_id).await?;

        let mut seat_map = acquire(&movie.seats, Resource::Movie(movie.info.id), self.lock_timeout).await?;
        let mut account = acquire(&user.account, Resource::User(user_id), self.lock_timeout).await?;

        // a concurrent cancellation may have won the locks first
        if !account.tickets.contains(&ticket_id) {
            return Err(BookingError::NotFound(Resource::Ticket(ticket_id)));
        }
        let ticket = self.tickets.read(ticket_id).await?;

        let refund = match AccountLedger.decide(
            &account,
            AccountCommand::Credit { amount: ticket.cost },
            &self.account_env,
        ) {
            Ok(refund) => refund,
            Err(error) => {
                tracing::warn!(error = %error, "Refund rejected, ticket kept");
                return Err(error);
            }
        };

        InventoryLedger.release(&mut seat_map, ticket.seats.clone(), &self.inventory_env);
        AccountLedger.apply(&mut account, &refund);
        account.detach_ticket(&ticket_id);

        if let Err(error) = self.tickets.delete(ticket_id).await {
            tracing::error!(error = %error, "Ticket delete failed after seats and refund were returned");
            return Err(error);
        }

        let available = seat_map.available();
        drop(account);
        drop(seat_map);

        metrics::record_seats_available(ticket.movie_id, available);
        metrics::record_cancellation(ticket.cost);
        tracing::info!(refund = %ticket.cost, seats = ticket.seat_count(), "Ticket cancelled");
        self.feed.publish(BookingEvent::TicketCancelled {
            ticket_id,
            user_id,
            movie_id: ticket.movie_id,
            seats: ticket.seats.clone(),
            refund: ticket.cost,
            at: self.clock.now(),
        });

        Ok(ticket)
    }

    // ========================================================================
    // Balance
    // ========================================================================

    /// Adds money to a user's balance and returns the new balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for negative amounts, `NotFound` for unknown users,
    /// `Busy` when the account lock is not acquired in time.
    #[tracing::instrument(skip(self), fields(%user_id))]
    pub async fn top_up_balance(&self, user_id: UserId, amount: i64) -> Result<Money, BookingError> {
        let amount = validate_amount(amount)?;
        let user = self.users.get(user_id).await?;

        let mut account = acquire(&user.account, Resource::User(user_id), self.lock_timeout).await?;
        let balance = AccountLedger.credit(&mut account, amount, &self.account_env)?;
        drop(account);

        metrics::record_balance_operation("top_up");
        tracing::info!(amount = %amount, balance = %balance, "Balance topped up");
        self.feed.publish(BookingEvent::BalanceToppedUp {
            user_id,
            amount,
            balance,
            at: self.clock.now(),
        });
        Ok(balance)
    }

    /// Takes money from a user's balance and returns the new balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for negative amounts, `InsufficientBalance` when the
    /// amount exceeds the balance, `NotFound` for unknown users, `Busy` when
    /// the account lock is not acquired in time.
    #[tracing::instrument(skip(self), fields(%user_id))]
    pub async fn withdraw_balance(
        &self,
        user_id: UserId,
        amount: i64,
    ) -> Result<Money, BookingError> {
        let amount = validate_amount(amount)?;
        let user = self.users.get(user_id).await?;

        let mut account = acquire(&user.account, Resource::User(user_id), self.lock_timeout).await?;
        let balance = match AccountLedger.debit(&mut account, amount, &self.account_env) {
            Ok(balance) => balance,
            Err(error) => {
                tracing::warn!(error = %error, "Withdrawal rejected");
                return Err(error);
            }
        };
        drop(account);

        metrics::record_balance_operation("withdraw");
        tracing::info!(amount = %amount, balance = %balance, "Balance withdrawn");
        self.feed.publish(BookingEvent::BalanceWithdrawn {
            user_id,
            amount,
            balance,
            at: self.clock.now(),
        });
        Ok(balance)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Registers a user with a zero balance.
    ///
    /// # Errors
    ///
    /// `UsernameTaken` if the username is in use.
    #[tracing::instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn register_user(&self, new_user: NewUser) -> Result<UserView, BookingError> {
        let entry = self.users.register(new_user, self.clock.now()).await?;
        let profile = entry.profile.clone();

        tracing::info!(user_id = %profile.id, "User registered");
        self.feed.publish(BookingEvent::UserRegistered {
            user_id: profile.id,
            username: profile.username.clone(),
            at: profile.created_at,
        });

        Ok(UserView {
            profile,
            balance: Money::ZERO,
            tickets: Vec::new(),
        })
    }

    /// Profile, balance and tickets of a user.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown users, `Busy` when the account lock is not
    /// acquired in time.
    pub async fn user(&self, user_id: UserId) -> Result<UserView, BookingError> {
        let entry = self.users.get(user_id).await?;
        self.user_view(&entry).await
    }

    /// Same as [`BoxOffice::user`], looked up by username.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown usernames, `Busy` when the account lock is not
    /// acquired in time.
    pub async fn user_by_username(&self, username: &str) -> Result<UserView, BookingError> {
        let entry = self.users.by_username(username).await?;
        self.user_view(&entry).await
    }

    async fn user_view(&self, entry: &UserEntry) -> Result<UserView, BookingError> {
        let account = acquire(&entry.account, Resource::User(entry.profile.id), self.lock_timeout).await?;
        Ok(UserView {
            profile: entry.profile.clone(),
            balance: account.balance,
            tickets: account.tickets.clone(),
        })
    }

    // ========================================================================
    // Movies and tickets
    // ========================================================================

    /// A movie with a snapshot of its seat map.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown movies, `Busy` when the seat lock is not
    /// acquired in time.
    pub async fn movie(&self, movie_id: MovieId) -> Result<Movie, BookingError> {
        let entry = self.movies.get(movie_id)?;
        let seats = acquire(&entry.seats, Resource::Movie(movie_id), self.lock_timeout).await?;
        Ok(Movie {
            info: entry.info.clone(),
            seats: seats.clone(),
        })
    }

    /// The catalog with seat counts, in id order.
    ///
    /// # Errors
    ///
    /// `Busy` when a seat lock is not acquired in time.
    pub async fn movies(&self) -> Result<Vec<MovieSummary>, BookingError> {
        let mut summaries = Vec::with_capacity(self.movies.len());
        for entry in self.movies.iter() {
            summaries.push(self.summary(entry).await?);
        }
        Ok(summaries)
    }

    async fn summary(&self, entry: &MovieEntry) -> Result<MovieSummary, BookingError> {
        let seats = acquire(&entry.seats, Resource::Movie(entry.info.id), self.lock_timeout).await?;
        Ok(MovieSummary {
            info: entry.info.clone(),
            total_seats: seats.len(),
            available_seats: seats.available(),
        })
    }

    /// Reads a ticket by id.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown or cancelled tickets.
    pub async fn ticket(&self, ticket_id: TicketId) -> Result<Ticket, BookingError> {
        self.tickets.read(ticket_id).await
    }

    /// Receives every booking event published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use boxoffice_core::SeatLayout;

    fn movie(id: u64, age_rating: u32, price: u64) -> Movie {
        let info = MovieInfo {
            id: MovieId::new(id),
            title: format!("Movie {id}"),
            description: String::new(),
            release_date: String::new(),
            age_rating,
            ticket_price: Money::from_cents(price),
            poster_url: String::new(),
        };
        Movie::new(info, &SeatLayout::rectangular(8, 8).unwrap())
    }

    fn new_user(username: &str, age: u32) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            name: username.to_string(),
            age,
        }
    }

    fn box_office(lock_timeout_ms: u64) -> BoxOffice {
        BoxOffice::builder()
            .movies([movie(1, 17, 1000)])
            .config(BookingConfig {
                lock_timeout_ms,
                ..BookingConfig::default()
            })
            .build()
    }

    #[tokio::test]
    async fn held_movie_lock_makes_purchase_busy() {
        let office = box_office(10);
        let user = office.register_user(new_user("ana", 20)).await.unwrap();
        office.top_up_balance(user.profile.id, 5000).await.unwrap();

        let entry = office.movies.get(MovieId::new(1)).unwrap();
        let held = entry.seats.lock().await;

        let result = office
            .purchase_ticket(user.profile.id, MovieId::new(1), vec![SeatKey::new('A', 1)])
            .await;
        match result {
            Err(error @ BookingError::Busy { .. }) => assert!(error.is_retryable()),
            other => panic!("expected Busy, got {other:?}"),
        }
        drop(held);

        // nothing changed while the lock was held elsewhere
        let view = office.user(user.profile.id).await.unwrap();
        assert_eq!(view.balance, Money::from_cents(5000));
        assert!(view.tickets.is_empty());
    }

    #[tokio::test]
    async fn held_account_lock_makes_top_up_busy() {
        let office = box_office(10);
        let user = office.register_user(new_user("ben", 30)).await.unwrap();

        let entry = office.users.get(user.profile.id).await.unwrap();
        let _held = entry.account.lock().await;

        let result = office.top_up_balance(user.profile.id, 100).await;
        assert!(matches!(
            result,
            Err(BookingError::Busy { resource: Resource::User(_), .. })
        ));
    }

    #[tokio::test]
    async fn purchase_updates_ticket_index_and_summary() {
        let office = box_office(1000);
        let user = office.register_user(new_user("cy", 40)).await.unwrap();
        office.top_up_balance(user.profile.id, 10_000).await.unwrap();

        let ticket = office
            .purchase_ticket(
                user.profile.id,
                MovieId::new(1),
                vec![SeatKey::new('C', 3), SeatKey::new('C', 4), SeatKey::new('C', 5)],
            )
            .await
            .unwrap();

        let view = office.user(user.profile.id).await.unwrap();
        assert_eq!(view.tickets, vec![ticket.id]);
        assert_eq!(view.balance, Money::from_cents(7000));

        let summaries = office.movies().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_seats, 64);
        assert_eq!(summaries[0].available_seats, 61);
    }

    #[tokio::test]
    async fn unknown_movie_and_user_are_not_found() {
        let office = box_office(1000);
        let user = office.register_user(new_user("dee", 25)).await.unwrap();

        assert_eq!(
            office
                .purchase_ticket(user.profile.id, MovieId::new(99), vec![SeatKey::new('A', 1)])
                .await
                .unwrap_err(),
            BookingError::NotFound(Resource::Movie(MovieId::new(99)))
        );

        let stranger = UserId::new();
        assert_eq!(
            office.top_up_balance(stranger, 10).await.unwrap_err(),
            BookingError::NotFound(Resource::User(stranger))
        );
    }

    #[tokio::test]
    async fn negative_amounts_are_rejected_before_lookup() {
        let office = box_office(1000);
        let stranger = UserId::new();
        assert_eq!(
            office.withdraw_balance(stranger, -5).await.unwrap_err(),
            BookingError::InvalidAmount(-5)
        );
    }
}
