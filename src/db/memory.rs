use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::store::{MovieStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{
        Genre, GenreCount, Movie, NewMovie, OnDemand, Person, Review, WatchList, WatchListItem,
    },
    services::slug,
};

/// In-process store backed by a shared `RwLock`.
///
/// Cloning shares the same data. Used by the test suite and handy for
/// running the API without a database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    movies: Vec<Movie>,
    genres: Vec<Genre>,
    directors: Vec<Person>,
    actors: Vec<Person>,
    next_review_id: i64,
    next_on_demand_id: i64,
    lists: Vec<WatchList>,
    items: Vec<WatchListItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Finds a row by name or appends it with the next id
fn get_or_create<T: Clone>(
    rows: &mut Vec<T>,
    name: &str,
    name_of: impl Fn(&T) -> &str,
    build: impl FnOnce(i64) -> T,
) -> T {
    if let Some(row) = rows.iter().find(|row| name_of(row) == name) {
        return row.clone();
    }
    let row = build(rows.len() as i64 + 1);
    rows.push(row.clone());
    row
}

#[async_trait::async_trait]
impl MovieStore for MemoryStore {
    async fn all_movies(&self) -> AppResult<Vec<Movie>> {
        Ok(self.inner.read().await.movies.clone())
    }

    async fn movie_by_slug(&self, slug: &str) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().find(|m| m.slug == slug).cloned())
    }

    async fn movie_by_imdb_id(&self, imdb_id: &str) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().find(|m| m.imdb_id == imdb_id).cloned())
    }

    async fn all_slugs(&self) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().map(|m| m.slug.clone()).collect())
    }

    async fn existing_imdb_ids(&self) -> AppResult<HashSet<String>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.iter().map(|m| m.imdb_id.clone()).collect())
    }

    async fn insert_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;

        if inner.movies.iter().any(|m| m.imdb_id == movie.imdb_id) {
            return Err(AppError::Internal(format!(
                "movie {} already exists",
                movie.imdb_id
            )));
        }

        let slug = movie.slug.unwrap_or_else(|| slug::generate(&movie.title));
        if inner.movies.iter().any(|m| m.slug == slug) {
            return Err(AppError::Internal(format!("slug {} already exists", slug)));
        }

        let genres = movie
            .genres
            .iter()
            .map(|name| {
                get_or_create(&mut inner.genres, name, |g| g.name.as_str(), |id| Genre {
                    id,
                    name: name.clone(),
                })
            })
            .collect();
        let directors = movie
            .directors
            .iter()
            .map(|name| {
                get_or_create(&mut inner.directors, name, |p| p.name.as_str(), |id| Person {
                    id,
                    name: name.clone(),
                })
            })
            .collect();
        let actors = movie
            .actors
            .iter()
            .map(|name| {
                get_or_create(&mut inner.actors, name, |p| p.name.as_str(), |id| Person {
                    id,
                    name: name.clone(),
                })
            })
            .collect();

        let mut reviews = Vec::with_capacity(movie.ratings.len());
        for (source, score) in movie.ratings {
            inner.next_review_id += 1;
            reviews.push(Review {
                id: inner.next_review_id,
                source,
                score,
            });
        }

        let stored = Movie {
            imdb_id: movie.imdb_id,
            slug,
            title: movie.title,
            rated: movie.rated,
            released: movie.released,
            runtime: movie.runtime,
            writer: movie.writer,
            plot: movie.plot,
            language: movie.language,
            country: movie.country,
            poster_url: movie.poster_url,
            genres,
            directors,
            actors,
            on_demand: Vec::new(),
            reviews,
        };

        inner.movies.push(stored.clone());
        Ok(stored)
    }

    async fn add_on_demand(
        &self,
        imdb_id: &str,
        service: &str,
        url: &str,
    ) -> AppResult<OnDemand> {
        let mut inner = self.inner.write().await;
        inner.next_on_demand_id += 1;
        let on_demand = OnDemand {
            id: inner.next_on_demand_id,
            service: service.to_string(),
            url: url.to_string(),
        };

        let movie = inner
            .movies
            .iter_mut()
            .find(|m| m.imdb_id == imdb_id)
            .ok_or_else(|| AppError::NotFound(format!("movie {}", imdb_id)))?;
        movie.on_demand.push(on_demand.clone());

        Ok(on_demand)
    }

    async fn genre_counts(&self) -> AppResult<Vec<GenreCount>> {
        let inner = self.inner.read().await;

        let mut counts: HashMap<i64, i64> = HashMap::new();
        for movie in &inner.movies {
            for genre in &movie.genres {
                *counts.entry(genre.id).or_default() += 1;
            }
        }

        let mut genres: Vec<GenreCount> = inner
            .genres
            .iter()
            .map(|g| GenreCount {
                id: g.id,
                name: g.name.clone(),
                movie_count: counts.get(&g.id).copied().unwrap_or(0),
            })
            .collect();
        genres.sort_by(|a, b| {
            b.movie_count
                .cmp(&a.movie_count)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(genres)
    }
}

#[async_trait::async_trait]
impl WatchlistStore for MemoryStore {
    async fn get_or_create_list(&self, owner: Uuid, name: &str) -> AppResult<WatchList> {
        // Holding the write lock across lookup and insert makes this atomic
        let mut inner = self.inner.write().await;

        if let Some(list) = inner
            .lists
            .iter()
            .find(|l| l.owner_id == owner && l.name == name)
        {
            return Ok(list.clone());
        }

        let now = Utc::now();
        let list = WatchList {
            id: inner.lists.len() as i64 + 1,
            owner_id: owner,
            name: name.to_string(),
            added: now,
            updated: now,
        };
        inner.lists.push(list.clone());
        Ok(list)
    }

    async fn listed_imdb_ids(&self, owner: Uuid) -> AppResult<HashSet<String>> {
        let inner = self.inner.read().await;
        let owned: HashSet<i64> = inner
            .lists
            .iter()
            .filter(|l| l.owner_id == owner)
            .map(|l| l.id)
            .collect();

        Ok(inner
            .items
            .iter()
            .filter(|item| owned.contains(&item.list_id))
            .map(|item| item.imdb_id.clone())
            .collect())
    }

    async fn list_items(&self, list_id: i64) -> AppResult<Vec<WatchListItem>> {
        let inner = self.inner.read().await;
        // Items are appended in time order, so reversing yields newest first
        Ok(inner
            .items
            .iter()
            .rev()
            .filter(|item| item.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn add_item(&self, list_id: i64, imdb_id: &str) -> AppResult<WatchListItem> {
        let mut inner = self.inner.write().await;
        let item = WatchListItem {
            uid: Uuid::new_v4(),
            list_id,
            imdb_id: imdb_id.to_string(),
            watched: false,
            added: Utc::now(),
        };
        inner.items.push(item.clone());
        Ok(item)
    }

    async fn owned_item(
        &self,
        owner: Uuid,
        uid: Uuid,
    ) -> AppResult<Option<(WatchList, WatchListItem)>> {
        let inner = self.inner.read().await;
        let Some(item) = inner.items.iter().find(|item| item.uid == uid) else {
            return Ok(None);
        };

        Ok(inner
            .lists
            .iter()
            .find(|l| l.id == item.list_id && l.owner_id == owner)
            .map(|list| (list.clone(), item.clone())))
    }

    async fn delete_item(&self, uid: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.items.len();
        inner.items.retain(|item| item.uid != uid);
        Ok(inner.items.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatingSource;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    pub(crate) fn new_movie(imdb_id: &str, title: &str, genres: &[&str]) -> NewMovie {
        NewMovie {
            imdb_id: imdb_id.to_string(),
            slug: None,
            title: title.to_string(),
            rated: None,
            released: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            runtime: Some(100),
            writer: None,
            plot: Some("plot".to_string()),
            language: None,
            country: None,
            poster_url: "www.poster.jpg".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            directors: vec!["Len Z".to_string()],
            actors: vec!["Clem Fandango".to_string()],
            ratings: BTreeMap::from([(RatingSource::Imdb, 70)]),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_slug_and_reuses_genres() {
        let store = MemoryStore::new();
        let first = store
            .insert_movie(new_movie("tt1", "Funny Tests", &["comedy"]))
            .await
            .unwrap();
        let second = store
            .insert_movie(new_movie("tt2", "Funny Tests", &["comedy", "drama"]))
            .await
            .unwrap();

        assert!(first.slug.ends_with("-funny-tests"));
        assert_ne!(first.slug, second.slug);
        assert_eq!(first.genres[0].id, second.genres[0].id);
        assert_eq!(second.reviews.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_imdb_id() {
        let store = MemoryStore::new();
        store.insert_movie(new_movie("tt1", "A", &[])).await.unwrap();
        assert!(store.insert_movie(new_movie("tt1", "B", &[])).await.is_err());
    }

    #[tokio::test]
    async fn test_genre_counts_ordering() {
        let store = MemoryStore::new();
        store.insert_movie(new_movie("tt1", "A", &["horror"])).await.unwrap();
        store.insert_movie(new_movie("tt2", "B", &["comedy"])).await.unwrap();
        store.insert_movie(new_movie("tt3", "C", &["comedy"])).await.unwrap();
        store.insert_movie(new_movie("tt4", "D", &["drama"])).await.unwrap();

        let names: Vec<String> = store
            .genre_counts()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["comedy", "drama", "horror"]);
    }

    #[tokio::test]
    async fn test_get_or_create_list_is_idempotent() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let (a, b) = tokio::join!(
            store.get_or_create_list(owner, "watch-list"),
            store.get_or_create_list(owner, "watch-list")
        );
        assert_eq!(a.unwrap().id, b.unwrap().id);
    }

    #[tokio::test]
    async fn test_owned_item_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let list = store.get_or_create_list(owner, "watch-list").await.unwrap();
        let item = store.add_item(list.id, "tt1").await.unwrap();

        assert!(store.owned_item(owner, item.uid).await.unwrap().is_some());
        assert!(store
            .owned_item(Uuid::new_v4(), item.uid)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store.listed_imdb_ids(owner).await.unwrap(),
            HashSet::from(["tt1".to_string()])
        );
    }
}
