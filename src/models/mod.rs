pub mod filter;
pub mod movie;
pub mod omdb;
pub mod watchlist;

pub use filter::{DecadeBound, FilterCriteria, MovieQuery, RuntimeBound};
pub use movie::{
    Genre, GenreCount, Movie, NewMovie, NormalizedMovie, OnDemand, Person, RatedMovie,
    RatingSource, Review, NOT_AVAILABLE,
};
pub use omdb::{OmdbRating, OmdbRecord};
pub use watchlist::{AddItemRequest, ItemView, ListSummary, WatchList, WatchListItem, DEFAULT_LIST};

use serde::Serialize;

/// Envelope for list endpoints
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub results: Vec<T>,
}

impl<T> From<Vec<T>> for Page<T> {
    fn from(results: Vec<T>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }
}
