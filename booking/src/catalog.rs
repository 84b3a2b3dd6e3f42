//! Movie catalog loading.
//!
//! The catalog arrives once at startup as a JSON array of movie records,
//! either from an HTTP feed or a local file. Each accepted record gets a
//! fresh seat map built from the configured layout.

use crate::config::CatalogConfig;
use boxoffice_core::{LayoutError, Money, Movie, MovieId, MovieInfo, SeatLayout};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Catalog loading errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Reading the catalog file failed
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// Fetching the catalog feed failed
    #[error("Failed to fetch catalog: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog is not a JSON array of movie records
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A record violates a catalog rule
    #[error("Invalid movie {id}: {reason}")]
    InvalidMovie {
        /// Offending record
        id: u64,
        /// What is wrong with it
        reason: String,
    },

    /// Two records share an id
    #[error("Duplicate movie id {0}")]
    DuplicateMovie(u64),

    /// The configured seat layout is invalid
    #[error("Invalid seat layout: {0}")]
    Layout(#[from] LayoutError),

    /// Neither a URL nor a path is configured
    #[error("No catalog source configured (set CATALOG_URL or CATALOG_PATH)")]
    NoSource,
}

/// One movie as published by the catalog feed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Catalog id
    pub id: u64,
    /// Title
    pub title: String,
    /// Synopsis
    #[serde(default)]
    pub description: String,
    /// Release date, kept as published
    #[serde(default)]
    pub release_date: String,
    /// Minimum viewer age
    #[serde(default)]
    pub age_rating: u32,
    /// Poster image URL
    #[serde(default)]
    pub poster_url: String,
    /// Price of one seat in the smallest currency unit
    pub ticket_price: i64,
}

impl MovieRecord {
    fn into_info(self) -> Result<MovieInfo, CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::InvalidMovie {
                id: self.id,
                reason: "title is empty".to_string(),
            });
        }

        let price = u64::try_from(self.ticket_price)
            .ok()
            .filter(|cents| *cents > 0)
            .ok_or_else(|| CatalogError::InvalidMovie {
                id: self.id,
                reason: format!("ticket price must be positive, got {}", self.ticket_price),
            })?;

        Ok(MovieInfo {
            id: MovieId::new(self.id),
            title: self.title,
            description: self.description,
            release_date: self.release_date,
            age_rating: self.age_rating,
            ticket_price: Money::from_cents(price),
            poster_url: self.poster_url,
        })
    }
}

/// Validated movies, each with an all-free seat map
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
}

impl Catalog {
    /// Validates records and attaches a seat map to each.
    ///
    /// # Errors
    ///
    /// `InvalidMovie` for an empty title or non-positive price,
    /// `DuplicateMovie` for repeated ids.
    pub fn from_records(
        records: Vec<MovieRecord>,
        layout: &SeatLayout,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut movies = Vec::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.id) {
                return Err(CatalogError::DuplicateMovie(record.id));
            }
            movies.push(Movie::new(record.into_info()?, layout));
        }

        Ok(Self { movies })
    }

    /// Parses a JSON array of movie records.
    ///
    /// # Errors
    ///
    /// `Json` for malformed input, plus the errors of [`Catalog::from_records`].
    pub fn from_json(bytes: &[u8], layout: &SeatLayout) -> Result<Self, CatalogError> {
        let records: Vec<MovieRecord> = serde_json::from_slice(bytes)?;
        Self::from_records(records, layout)
    }

    /// Reads the catalog from a local JSON file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, plus the errors of [`Catalog::from_json`].
    pub async fn from_path(path: &Path, layout: &SeatLayout) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path).await?;
        let catalog = Self::from_json(&bytes, layout)?;
        tracing::info!(path = %path.display(), movies = catalog.len(), "Loaded catalog from file");
        Ok(catalog)
    }

    /// Fetches the catalog from an HTTP feed.
    ///
    /// # Errors
    ///
    /// `Http` for connection failures, timeouts and non-success statuses,
    /// plus the errors of [`Catalog::from_json`].
    pub async fn from_url(
        url: &str,
        timeout: Duration,
        layout: &SeatLayout,
    ) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let bytes = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let catalog = Self::from_json(&bytes, layout)?;
        tracing::info!(url, movies = catalog.len(), "Fetched catalog");
        Ok(catalog)
    }

    /// Loads the catalog from the configured source, URL first.
    ///
    /// # Errors
    ///
    /// `NoSource` when neither a URL nor a path is configured, `Layout` for
    /// invalid seat dimensions, plus the errors of the chosen source.
    pub async fn load(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let layout = SeatLayout::rectangular(config.rows, config.seats_per_row)?;

        if let Some(url) = &config.url {
            return Self::from_url(url, config.fetch_timeout(), &layout).await;
        }
        if let Some(path) = &config.path {
            return Self::from_path(path, &layout).await;
        }
        Err(CatalogError::NoSource)
    }

    /// Number of movies
    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// The movies, in feed order
    #[must_use]
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Takes the movies out of the catalog
    #[must_use]
    pub fn into_movies(self) -> Vec<Movie> {
        self.movies
    }
}
