//! Box Office Demo
//!
//! Walks through the booking engine end to end:
//! - Catalog loading (feed URL, file, or the built-in sample)
//! - A successful purchase and its cancellation
//! - Rejections: insufficient balance, age restriction, seat limit
//! - Many buyers racing for the same seat
//! - The Prometheus metrics snapshot
//!
//! # Usage
//!
//! ```bash
//! CATALOG_PATH=movies.json cargo run --bin demo
//! ```

use anyhow::Context;
use boxoffice::{BoxOffice, Catalog, CatalogError, Config, metrics};
use boxoffice_core::retry::retry_when_busy;
use boxoffice_core::{MovieId, NewUser, SeatKey, SeatLayout, UserId};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SAMPLE_CATALOG: &str = r#"[
    {
        "id": 1,
        "title": "Fast X",
        "description": "Dom Toretto and his family are targeted by the vengeful son of a drug kingpin.",
        "release_date": "2023-05-17",
        "poster_url": "https://image.tmdb.org/t/p/w500/fiVW06jE7z9YnO4trhaMEdclSiC.jpg",
        "age_rating": 15,
        "ticket_price": 1000
    },
    {
        "id": 2,
        "title": "John Wick: Chapter 4",
        "description": "John Wick uncovers a path to defeating The High Table.",
        "release_date": "2023-03-22",
        "poster_url": "https://image.tmdb.org/t/p/w500/vZloFAK7NmvMGKE7VkF5UHaz0I.jpg",
        "age_rating": 17,
        "ticket_price": 1000
    }
]"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boxoffice=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;
    metrics::register_business_metrics();

    println!("\n=============================================");
    println!("   Box Office - Live Demo");
    println!("=============================================\n");

    let config = Config::from_env();
    let catalog = match Catalog::load(&config.catalog).await {
        Ok(catalog) => catalog,
        Err(CatalogError::NoSource) => {
            println!("No CATALOG_URL or CATALOG_PATH set, using the built-in sample\n");
            let layout = SeatLayout::rectangular(config.catalog.rows, config.catalog.seats_per_row)?;
            Catalog::from_json(SAMPLE_CATALOG.as_bytes(), &layout)?
        }
        Err(error) => return Err(error).context("failed to load catalog"),
    };

    let retry = config.booking.retry_policy();
    let office = Arc::new(
        BoxOffice::builder()
            .catalog(catalog)
            .config(config.booking.clone())
            .build(),
    );

    let mut events = office.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("   [event] {}", event.event_type());
        }
    });

    for movie in office.movies().await? {
        println!(
            "   #{} {} (rated {}+, {} per seat, {}/{} free)",
            movie.info.id,
            movie.info.title,
            movie.info.age_rating,
            movie.info.ticket_price,
            movie.available_seats,
            movie.total_seats
        );
    }
    let movie_id = MovieId::new(2);

    // ========== Scenario 1: purchase ==========
    println!("\n1. Adult with 50.00 buys A1 and A2");
    let adult = register(&office, "ana", 20).await?;
    office.top_up_balance(adult, 5000).await?;
    let ticket = retry_when_busy(&retry, || {
        office.purchase_ticket(adult, movie_id, vec![SeatKey::new('A', 1), SeatKey::new('A', 2)])
    })
    .await?;
    let view = office.user(adult).await?;
    println!("   ticket {} cost {}, balance now {}", ticket.id, ticket.cost, view.balance);

    // ========== Scenario 2: insufficient balance ==========
    println!("\n2. User with 5.00 tries to buy one seat");
    let poor = register(&office, "ben", 20).await?;
    office.top_up_balance(poor, 500).await?;
    let result = office
        .purchase_ticket(poor, movie_id, vec![SeatKey::new('B', 1)])
        .await;
    println!("   -> {}", describe(result.map(|t| t.id)));

    // ========== Scenario 3: age restriction ==========
    println!("\n3. Ten-year-old tries a 17+ movie");
    let child = register(&office, "cy", 10).await?;
    office.top_up_balance(child, 5000).await?;
    let result = office
        .purchase_ticket(child, movie_id, vec![SeatKey::new('C', 1)])
        .await;
    println!("   -> {}", describe(result.map(|t| t.id)));

    // ========== Scenario 4: seat limit ==========
    println!("\n4. Requesting seven seats at once");
    let seven = (1..=7).map(|n| SeatKey::new('D', n)).collect();
    let result = office.purchase_ticket(adult, movie_id, seven).await;
    println!("   -> {}", describe(result.map(|t| t.id)));

    // ========== Scenario 5: cancellation ==========
    println!("\n5. Cancelling the first ticket");
    let cancelled = office.cancel_ticket(adult, ticket.id).await?;
    let view = office.user(adult).await?;
    println!("   refunded {}, balance back to {}", cancelled.cost, view.balance);
    println!("   reading it again -> {}", describe(office.ticket(ticket.id).await.map(|t| t.id)));

    // ========== Scenario 6: race for one seat ==========
    println!("\n6. Twenty buyers race for H8");
    let mut buyers = Vec::new();
    for n in 0..20 {
        let user_id = register(&office, &format!("racer{n}"), 30).await?;
        office.top_up_balance(user_id, 1000).await?;
        buyers.push(user_id);
    }
    let attempts = buyers.into_iter().map(|user_id| {
        let office = Arc::clone(&office);
        tokio::spawn(async move {
            office
                .purchase_ticket(user_id, movie_id, vec![SeatKey::new('H', 8)])
                .await
        })
    });
    let results = futures::future::join_all(attempts).await;
    let winners = results
        .iter()
        .filter(|joined| matches!(joined, Ok(Ok(_))))
        .count();
    println!("   {winners} winner(s), {} rejected", results.len() - winners);

    // ========== Metrics ==========
    println!("\n7. Metrics snapshot\n");
    println!("{}", prometheus.render());

    drop(office);
    printer.abort();
    Ok(())
}

async fn register(office: &BoxOffice, username: &str, age: u32) -> anyhow::Result<UserId> {
    let user = office
        .register_user(NewUser {
            username: username.to_string(),
            password_hash: format!("demo-hash-{username}"),
            name: username.to_string(),
            age,
        })
        .await
        .with_context(|| format!("failed to register {username}"))?;
    Ok(user.profile.id)
}

fn describe<T: std::fmt::Display>(result: Result<T, boxoffice_core::BookingError>) -> String {
    match result {
        Ok(value) => format!("ok ({value})"),
        Err(error) => format!("{} ({error})", error.kind()),
    }
}
