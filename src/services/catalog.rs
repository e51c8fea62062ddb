//! Catalog query engine.
//!
//! `list` runs a fixed pipeline over every stored movie:
//! annotate, genre filter, decade filter, runtime filter, rating floor,
//! poster filter, dedup, sort. Each stage is a plain function over
//! `Vec<RatedMovie>` so the order is visible in one place and every stage
//! can be tested alone.

use std::{collections::HashSet, sync::Arc};

use chrono::NaiveDate;
use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

use crate::{
    db::{MovieStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{DecadeBound, FilterCriteria, GenreCount, Movie, RatedMovie, RuntimeBound, NOT_AVAILABLE},
};

/// Movies rated below this are never listed
pub const RATING_FLOOR: f64 = 40.0;

const PRE_DECADE_MIN_YEAR: i32 = 1920;
const PRE_DECADE_MAX_YEAR: i32 = 1959;

const RUNTIME_FLOOR: u32 = 0;
const RUNTIME_ABOVE_MIN: u32 = 151;
const RUNTIME_BELOW_MAX: u32 = 74;
const RUNTIME_CEILING: u32 = 400;
const RUNTIME_WIDEN_BY: u32 = 3;

#[derive(Clone)]
pub struct CatalogService {
    movies: Arc<dyn MovieStore>,
    watchlists: Arc<dyn WatchlistStore>,
}

impl CatalogService {
    pub fn new(movies: Arc<dyn MovieStore>, watchlists: Arc<dyn WatchlistStore>) -> Self {
        Self { movies, watchlists }
    }

    /// Filtered catalog, best rated first
    pub async fn list(
        &self,
        criteria: &FilterCriteria,
        viewer: Option<Uuid>,
    ) -> AppResult<Vec<RatedMovie>> {
        let movies = self.movies.all_movies().await?;
        let listed = self.listed_ids(viewer).await?;
        let total = movies.len();

        let mut rated = annotate(movies, &listed);
        rated = filter_genres(rated, &criteria.genres);
        if let Some((min, max)) = criteria.decades {
            rated = filter_decades(rated, min, max);
        }
        if let Some((min, max)) = criteria.runtimes {
            rated = filter_runtime(rated, min, max);
        }
        rated = drop_below_floor(rated);
        rated = drop_missing_poster(rated);
        rated = dedup(rated);
        sort_by_rating(&mut rated);

        tracing::debug!(total, matched = rated.len(), "Catalog listed");
        Ok(rated)
    }

    /// One movie by slug, annotated for `viewer` but not filtered
    pub async fn get(&self, slug: &str, viewer: Option<Uuid>) -> AppResult<RatedMovie> {
        let movie = self
            .movies
            .movie_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("movie {}", slug)))?;

        let on_list = match viewer {
            Some(owner) => self
                .watchlists
                .listed_imdb_ids(owner)
                .await?
                .contains(&movie.imdb_id),
            None => false,
        };

        Ok(RatedMovie::new(movie, on_list))
    }

    /// Uniformly random stored movie
    pub async fn pick_random(&self, viewer: Option<Uuid>) -> AppResult<RatedMovie> {
        let slugs = self.movies.all_slugs().await?;
        let slug = pick_slug(&slugs, &mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| AppError::NotFound("no movies in catalog".to_string()))?;

        self.get(&slug, viewer).await
    }

    pub async fn genres_by_popularity(&self) -> AppResult<Vec<GenreCount>> {
        self.movies.genre_counts().await
    }

    async fn listed_ids(&self, viewer: Option<Uuid>) -> AppResult<HashSet<String>> {
        match viewer {
            Some(owner) => self.watchlists.listed_imdb_ids(owner).await,
            None => Ok(HashSet::new()),
        }
    }
}

pub fn pick_slug<'a, R: Rng + ?Sized>(slugs: &'a [String], rng: &mut R) -> Option<&'a String> {
    slugs.choose(rng)
}

/// Computes the mean rating and watchlist membership of each movie
pub fn annotate(movies: Vec<Movie>, listed: &HashSet<String>) -> Vec<RatedMovie> {
    movies
        .into_iter()
        .map(|movie| {
            let on_list = listed.contains(&movie.imdb_id);
            RatedMovie::new(movie, on_list)
        })
        .collect()
}

/// Keeps movies tagged with any of `genre_ids`; no-op when empty
pub fn filter_genres(movies: Vec<RatedMovie>, genre_ids: &[i64]) -> Vec<RatedMovie> {
    if genre_ids.is_empty() {
        return movies;
    }
    movies
        .into_iter()
        .filter(|m| m.genre.iter().any(|g| genre_ids.contains(&g.id)))
        .collect()
}

/// Keeps movies released between the start of `min`'s year and the end of
/// `max`'s decade
pub fn filter_decades(movies: Vec<RatedMovie>, min: DecadeBound, max: DecadeBound) -> Vec<RatedMovie> {
    let (Some(start), Some(end)) = decade_window(min, max) else {
        return Vec::new();
    };
    movies
        .into_iter()
        .filter(|m| m.released >= start && m.released <= end)
        .collect()
}

fn decade_window(min: DecadeBound, max: DecadeBound) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let min_year = match min {
        DecadeBound::Pre => PRE_DECADE_MIN_YEAR,
        DecadeBound::Year(year) => i32::from(year),
    };
    let max_year = match max {
        DecadeBound::Pre => PRE_DECADE_MAX_YEAR,
        DecadeBound::Year(year) => i32::from(year) / 10 * 10 + 9,
    };

    (
        NaiveDate::from_ymd_opt(min_year, 1, 1),
        NaiveDate::from_ymd_opt(max_year, 12, 31),
    )
}

/// Keeps movies whose runtime falls in the resolved range.
///
/// Movies without a runtime never match.
pub fn filter_runtime(movies: Vec<RatedMovie>, min: RuntimeBound, max: RuntimeBound) -> Vec<RatedMovie> {
    let (low, high) = runtime_window(min, max);
    movies
        .into_iter()
        .filter(|m| match m.runtime {
            Some(runtime) => runtime >= 0 && (low..=high).contains(&(runtime as u32)),
            None => false,
        })
        .collect()
}

fn runtime_window(min: RuntimeBound, max: RuntimeBound) -> (u32, u32) {
    let low = match min {
        RuntimeBound::Below(_) => RUNTIME_FLOOR,
        RuntimeBound::Above(_) => RUNTIME_ABOVE_MIN,
        RuntimeBound::Minutes(n) => n,
    };
    let high = match max {
        RuntimeBound::Below(_) => RUNTIME_BELOW_MAX,
        RuntimeBound::Above(_) => RUNTIME_CEILING,
        RuntimeBound::Minutes(n) => n,
    };

    match (min, max) {
        (RuntimeBound::Minutes(a), RuntimeBound::Minutes(b)) if a == b => (
            low.saturating_sub(RUNTIME_WIDEN_BY),
            high.saturating_add(RUNTIME_WIDEN_BY),
        ),
        _ => (low, high),
    }
}

pub fn drop_below_floor(movies: Vec<RatedMovie>) -> Vec<RatedMovie> {
    movies
        .into_iter()
        .filter(|m| matches!(m.avg_rating, Some(avg) if avg >= RATING_FLOOR))
        .collect()
}

pub fn drop_missing_poster(movies: Vec<RatedMovie>) -> Vec<RatedMovie> {
    movies
        .into_iter()
        .filter(|m| m.poster_url != NOT_AVAILABLE)
        .collect()
}

/// First occurrence of each imdb id wins
pub fn dedup(movies: Vec<RatedMovie>) -> Vec<RatedMovie> {
    let mut seen = HashSet::new();
    movies
        .into_iter()
        .filter(|m| seen.insert(m.imdb_id.clone()))
        .collect()
}

/// Stable: equal ratings keep their relative order
pub fn sort_by_rating(movies: &mut [RatedMovie]) {
    movies.sort_by(|a, b| {
        let a = a.avg_rating.unwrap_or(f64::MIN);
        let b = b.avg_rating.unwrap_or(f64::MIN);
        b.total_cmp(&a)
    });
}
