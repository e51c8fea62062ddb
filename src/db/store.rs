use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{GenreCount, Movie, NewMovie, OnDemand, WatchList, WatchListItem},
};

/// Persistence for the movie catalog
///
/// Implemented by the Postgres store in production and by the in-memory
/// store in tests. Movies are returned in creation order.
#[async_trait::async_trait]
pub trait MovieStore: Send + Sync {
    /// Every stored movie with genres, people, reviews and on-demand links loaded
    async fn all_movies(&self) -> AppResult<Vec<Movie>>;

    async fn movie_by_slug(&self, slug: &str) -> AppResult<Option<Movie>>;

    async fn movie_by_imdb_id(&self, imdb_id: &str) -> AppResult<Option<Movie>>;

    async fn all_slugs(&self) -> AppResult<Vec<String>>;

    async fn existing_imdb_ids(&self) -> AppResult<HashSet<String>>;

    /// Inserts a movie with its joins atomically, assigning a slug when absent
    async fn insert_movie(&self, movie: NewMovie) -> AppResult<Movie>;

    async fn add_on_demand(&self, imdb_id: &str, service: &str, url: &str)
        -> AppResult<OnDemand>;

    /// Every genre with its movie count, most popular first, ties by name
    async fn genre_counts(&self) -> AppResult<Vec<GenreCount>>;
}

/// Persistence for viewers' watchlists
#[async_trait::async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Fetches the owner's list with this name, creating it if missing.
    ///
    /// Must be safe under concurrent first calls: exactly one list exists
    /// afterwards and every caller receives it.
    async fn get_or_create_list(&self, owner: Uuid, name: &str) -> AppResult<WatchList>;

    /// Imdb ids present in any list owned by `owner`
    async fn listed_imdb_ids(&self, owner: Uuid) -> AppResult<HashSet<String>>;

    /// Items of one list, newest first
    async fn list_items(&self, list_id: i64) -> AppResult<Vec<WatchListItem>>;

    async fn add_item(&self, list_id: i64, imdb_id: &str) -> AppResult<WatchListItem>;

    /// Looks up an item only if it belongs to one of `owner`'s lists
    async fn owned_item(
        &self,
        owner: Uuid,
        uid: Uuid,
    ) -> AppResult<Option<(WatchList, WatchListItem)>>;

    async fn delete_item(&self, uid: Uuid) -> AppResult<bool>;
}
