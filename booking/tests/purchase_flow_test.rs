//! End-to-end purchase scenarios against the in-memory box office.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use boxoffice::{BookingConfig, BookingEvent, BoxOffice};
use boxoffice_core::{BookingError, ErrorKind, Money, MovieId, Resource, UserId};
use boxoffice_testing::fixtures::{MovieBuilder, new_user, seat, seats};
use boxoffice_testing::{RecyclingTicketIds, SequentialTicketIds, test_clock};
use std::sync::Arc;

const MOVIE: MovieId = MovieId::new(1);

fn office() -> BoxOffice {
    BoxOffice::builder()
        .movies([MovieBuilder::new(1).price(1000).age_rating(17).build()])
        .clock(Arc::new(test_clock()))
        .ticket_ids(Arc::new(SequentialTicketIds::new()))
        .build()
}

async fn user_with_balance(office: &BoxOffice, name: &str, age: u32, cents: i64) -> UserId {
    let user = office.register_user(new_user(name, age)).await.unwrap();
    office.top_up_balance(user.profile.id, cents).await.unwrap();
    user.profile.id
}

#[tokio::test]
async fn successful_purchase_books_seats_and_debits_balance() {
    let office = office();
    let user = user_with_balance(&office, "ana", 20, 5000).await;

    let ticket = office
        .purchase_ticket(user, MOVIE, seats(&["A1", "A2"]))
        .await
        .unwrap();

    assert_eq!(ticket.id, SequentialTicketIds::nth(1));
    assert_eq!(ticket.cost, Money::from_cents(2000));
    assert_eq!(ticket.seats, seats(&["A1", "A2"]));
    assert_eq!(ticket.user_id, user);
    assert_eq!(ticket.created_at, ticket.updated_at);

    let view = office.user(user).await.unwrap();
    assert_eq!(view.balance, Money::from_cents(3000));
    assert_eq!(view.tickets, vec![ticket.id]);

    let movie = office.movie(MOVIE).await.unwrap();
    assert_eq!(movie.seats.is_booked(&seat('A', 1)), Some(true));
    assert_eq!(movie.seats.is_booked(&seat('A', 2)), Some(true));
    assert_eq!(movie.seats.available(), 62);

    assert_eq!(office.ticket(ticket.id).await.unwrap(), ticket);
}

#[tokio::test]
async fn insufficient_balance_leaves_no_trace() {
    let office = office();
    let user = user_with_balance(&office, "ben", 20, 500).await;

    let error = office
        .purchase_ticket(user, MOVIE, vec![seat('A', 1)])
        .await
        .unwrap_err();

    assert_eq!(
        error,
        BookingError::InsufficientBalance {
            balance: Money::from_cents(500),
            required: Money::from_cents(1000),
        }
    );
    let movie = office.movie(MOVIE).await.unwrap();
    assert_eq!(movie.seats.is_booked(&seat('A', 1)), Some(false));
    let view = office.user(user).await.unwrap();
    assert_eq!(view.balance, Money::from_cents(500));
    assert!(view.tickets.is_empty());
}

#[tokio::test]
async fn underage_viewer_is_rejected() {
    let office = office();
    let adult = user_with_balance(&office, "dee", 40, 5000).await;
    office
        .purchase_ticket(adult, MOVIE, vec![seat('A', 2)])
        .await
        .unwrap();
    let user = user_with_balance(&office, "cy", 10, 5000).await;

    // age is checked before any seat, so bad seats do not change the error
    let error = office
        .purchase_ticket(user, MOVIE, vec![seat('Z', 99), seat('A', 2)])
        .await
        .unwrap_err();

    assert_eq!(error, BookingError::AgeRestricted { rating: 17, age: 10 });
    assert_eq!(office.movie(MOVIE).await.unwrap().seats.available(), 63);
    assert_eq!(office.user(user).await.unwrap().balance, Money::from_cents(5000));
}

#[tokio::test]
async fn viewer_exactly_at_rating_may_buy() {
    let office = office();
    let user = user_with_balance(&office, "dee", 17, 1000).await;

    let ticket = office.purchase_ticket(user, MOVIE, vec![seat('B', 3)]).await;
    assert!(ticket.is_ok());
}

#[tokio::test]
async fn booked_seat_rejects_whole_request() {
    let office = office();
    let first = user_with_balance(&office, "eve", 30, 5000).await;
    let second = user_with_balance(&office, "fay", 30, 5000).await;

    office
        .purchase_ticket(first, MOVIE, vec![seat('C', 2)])
        .await
        .unwrap();

    let error = office
        .purchase_ticket(second, MOVIE, seats(&["C1", "C2", "C3"]))
        .await
        .unwrap_err();

    assert_eq!(error, BookingError::SeatUnavailable(seat('C', 2)));
    let movie = office.movie(MOVIE).await.unwrap();
    assert_eq!(movie.seats.is_booked(&seat('C', 1)), Some(false));
    assert_eq!(movie.seats.is_booked(&seat('C', 3)), Some(false));
    assert_eq!(office.user(second).await.unwrap().balance, Money::from_cents(5000));
}

#[tokio::test]
async fn request_validation_errors() {
    let office = office();
    let user = user_with_balance(&office, "gus", 30, 100_000).await;

    let error = office.purchase_ticket(user, MOVIE, Vec::new()).await.unwrap_err();
    assert_eq!(error, BookingError::NoSeatsRequested);

    let seven = (1..=7).map(|n| seat('D', n)).collect();
    let error = office.purchase_ticket(user, MOVIE, seven).await.unwrap_err();
    assert_eq!(error, BookingError::LimitExceeded { requested: 7, limit: 6 });

    let error = office
        .purchase_ticket(user, MOVIE, vec![seat('A', 1), seat('Z', 9)])
        .await
        .unwrap_err();
    assert_eq!(error, BookingError::SeatUnknown(seat('Z', 9)));

    let error = office
        .purchase_ticket(user, MOVIE, vec![seat('E', 1), seat('E', 1)])
        .await
        .unwrap_err();
    assert_eq!(error, BookingError::SeatUnavailable(seat('E', 1)));

    assert_eq!(office.movie(MOVIE).await.unwrap().seats.available(), 64);
    assert_eq!(office.user(user).await.unwrap().balance, Money::from_cents(100_000));
}

#[tokio::test]
async fn configured_seat_limit_applies() {
    let office = BoxOffice::builder()
        .movies([MovieBuilder::new(1).build()])
        .config(BookingConfig {
            max_seats_per_purchase: 2,
            ..BookingConfig::default()
        })
        .build();
    let user = user_with_balance(&office, "hal", 30, 100_000).await;

    let error = office
        .purchase_ticket(user, MOVIE, seats(&["A1", "A2", "A3"]))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::LimitExceeded);
}

#[tokio::test]
async fn unknown_movie_and_user_are_not_found() {
    let office = office();
    let user = user_with_balance(&office, "ivy", 30, 5000).await;

    let error = office
        .purchase_ticket(user, MovieId::new(99), vec![seat('A', 1)])
        .await
        .unwrap_err();
    assert_eq!(error, BookingError::NotFound(Resource::Movie(MovieId::new(99))));

    let stranger = UserId::new();
    let error = office
        .purchase_ticket(stranger, MOVIE, vec![seat('A', 1)])
        .await
        .unwrap_err();
    assert_eq!(error, BookingError::NotFound(Resource::User(stranger)));
}

#[tokio::test]
async fn duplicate_ticket_id_is_compensated() {
    let office = BoxOffice::builder()
        .movies([MovieBuilder::new(1).price(1000).build()])
        .ticket_ids(Arc::new(RecyclingTicketIds(SequentialTicketIds::nth(42))))
        .build();
    let user = user_with_balance(&office, "jo", 30, 5000).await;

    office
        .purchase_ticket(user, MOVIE, vec![seat('A', 1)])
        .await
        .unwrap();

    let error = office
        .purchase_ticket(user, MOVIE, vec![seat('A', 2)])
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Internal);
    let movie = office.movie(MOVIE).await.unwrap();
    assert_eq!(movie.seats.is_booked(&seat('A', 2)), Some(false));
    let view = office.user(user).await.unwrap();
    assert_eq!(view.balance, Money::from_cents(4000));
    assert_eq!(view.tickets.len(), 1);
}

#[tokio::test]
async fn purchase_is_published() {
    let office = office();
    let user = user_with_balance(&office, "kim", 30, 5000).await;
    let mut events = office.subscribe();

    let ticket = office
        .purchase_ticket(user, MOVIE, vec![seat('F', 4)])
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        BookingEvent::TicketPurchased {
            ticket_id, cost, seats, ..
        } => {
            assert_eq!(ticket_id, ticket.id);
            assert_eq!(cost, Money::from_cents(1000));
            assert_eq!(seats, vec![seat('F', 4)]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn balance_operations() {
    let office = office();
    let user = office.register_user(new_user("lou", 30)).await.unwrap().profile.id;

    assert_eq!(office.top_up_balance(user, 1500).await.unwrap(), Money::from_cents(1500));
    assert_eq!(office.top_up_balance(user, 0).await.unwrap(), Money::from_cents(1500));
    assert_eq!(office.withdraw_balance(user, 500).await.unwrap(), Money::from_cents(1000));

    let error = office.withdraw_balance(user, 1001).await.unwrap_err();
    assert_eq!(
        error,
        BookingError::InsufficientBalance {
            balance: Money::from_cents(1000),
            required: Money::from_cents(1001),
        }
    );
    assert_eq!(
        office.top_up_balance(user, -1).await.unwrap_err(),
        BookingError::InvalidAmount(-1)
    );
    assert_eq!(
        office.withdraw_balance(user, -1).await.unwrap_err(),
        BookingError::InvalidAmount(-1)
    );
    assert_eq!(office.user(user).await.unwrap().balance, Money::from_cents(1000));
}

#[tokio::test]
async fn usernames_are_unique() {
    let office = office();
    office.register_user(new_user("mo", 30)).await.unwrap();

    let error = office.register_user(new_user("mo", 40)).await.unwrap_err();
    assert_eq!(error, BookingError::UsernameTaken("mo".to_string()));

    let view = office.user_by_username("mo").await.unwrap();
    assert_eq!(view.profile.age, 30);
    assert_eq!(view.balance, Money::ZERO);
}
