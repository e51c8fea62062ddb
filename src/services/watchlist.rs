use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{MovieStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{ItemView, ListSummary, RatedMovie, WatchList, WatchListItem, DEFAULT_LIST},
};

/// A viewer's default watchlist
#[derive(Clone)]
pub struct WatchlistService {
    movies: Arc<dyn MovieStore>,
    watchlists: Arc<dyn WatchlistStore>,
}

impl WatchlistService {
    pub fn new(movies: Arc<dyn MovieStore>, watchlists: Arc<dyn WatchlistStore>) -> Self {
        Self { movies, watchlists }
    }

    /// Items of the owner's default list, newest first
    pub async fn items(&self, owner: Uuid) -> AppResult<Vec<ItemView>> {
        let list = self.default_list(owner).await?;
        let items = self.watchlists.list_items(list.id).await?;

        let mut views = Vec::with_capacity(items.len());
        for item in items {
            views.push(self.view(&list, item).await?);
        }
        Ok(views)
    }

    /// Adds the movie with `slug` to the owner's default list
    pub async fn add_by_slug(&self, owner: Uuid, slug: Option<&str>) -> AppResult<ItemView> {
        let slug = slug
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::validation("movie_slug", "This field is required."))?;

        let movie = self
            .movies
            .movie_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::validation("movie_slug", "movie does not exist."))?;

        let list = self.default_list(owner).await?;
        let item = self.watchlists.add_item(list.id, &movie.imdb_id).await?;

        tracing::info!(owner = %owner, slug = %slug, item = %item.uid, "Movie added to watchlist");
        Ok(ItemView {
            uid: item.uid,
            list: ListSummary::from(&list),
            movie: RatedMovie::new(movie, true),
            watched: item.watched,
            added: item.added,
        })
    }

    pub async fn get_item(&self, owner: Uuid, uid: Uuid) -> AppResult<ItemView> {
        let (list, item) = self.owned(owner, uid).await?;
        self.view(&list, item).await
    }

    pub async fn delete_item(&self, owner: Uuid, uid: Uuid) -> AppResult<()> {
        self.owned(owner, uid).await?;
        if !self.watchlists.delete_item(uid).await? {
            return Err(AppError::NotFound(format!("item {}", uid)));
        }
        tracing::info!(owner = %owner, item = %uid, "Watchlist item deleted");
        Ok(())
    }

    async fn default_list(&self, owner: Uuid) -> AppResult<WatchList> {
        self.watchlists.get_or_create_list(owner, DEFAULT_LIST).await
    }

    /// Items outside the owner's lists are reported as missing
    async fn owned(&self, owner: Uuid, uid: Uuid) -> AppResult<(WatchList, WatchListItem)> {
        self.watchlists
            .owned_item(owner, uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", uid)))
    }

    async fn view(&self, list: &WatchList, item: WatchListItem) -> AppResult<ItemView> {
        let movie = self
            .movies
            .movie_by_imdb_id(&item.imdb_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("item {} has no movie", item.uid)))?;

        Ok(ItemView {
            uid: item.uid,
            list: ListSummary::from(list),
            movie: RatedMovie::new(movie, true),
            watched: item.watched,
            added: item.added,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{NewMovie, RatingSource},
    };
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    async fn seeded() -> (WatchlistService, String) {
        let store = MemoryStore::new();
        let movie = store
            .insert_movie(NewMovie {
                imdb_id: "tt0000001".to_string(),
                slug: None,
                title: "Tester".to_string(),
                rated: None,
                released: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                runtime: Some(100),
                writer: None,
                plot: Some("plot".to_string()),
                language: None,
                country: None,
                poster_url: "www.poster.jpg".to_string(),
                genres: vec!["Drama".to_string()],
                directors: vec![],
                actors: vec![],
                ratings: BTreeMap::from([(RatingSource::Imdb, 70)]),
            })
            .await
            .unwrap();

        let service = WatchlistService::new(Arc::new(store.clone()), Arc::new(store));
        (service, movie.slug)
    }

    #[tokio::test]
    async fn test_add_and_list_items() {
        let (service, slug) = seeded().await;
        let owner = Uuid::new_v4();

        assert!(service.items(owner).await.unwrap().is_empty());

        let item = service.add_by_slug(owner, Some(&slug)).await.unwrap();
        assert_eq!(item.list.name, DEFAULT_LIST);
        assert!(item.movie.on_list);

        let items = service.items(owner).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].uid, item.uid);
    }

    #[tokio::test]
    async fn test_add_requires_known_slug() {
        let (service, _) = seeded().await;
        let owner = Uuid::new_v4();

        let missing = service.add_by_slug(owner, None).await;
        assert!(matches!(missing, Err(AppError::Validation { ref field, .. }) if field == "movie_slug"));

        let unknown = service.add_by_slug(owner, Some("nope")).await;
        assert!(
            matches!(unknown, Err(AppError::Validation { ref message, .. }) if message == "movie does not exist.")
        );
    }

    #[tokio::test]
    async fn test_items_are_scoped_to_owner() {
        let (service, slug) = seeded().await;
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let item = service.add_by_slug(owner, Some(&slug)).await.unwrap();

        assert!(matches!(
            service.get_item(stranger, item.uid).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_item(stranger, item.uid).await,
            Err(AppError::NotFound(_))
        ));

        service.delete_item(owner, item.uid).await.unwrap();
        assert!(matches!(
            service.get_item(owner, item.uid).await,
            Err(AppError::NotFound(_))
        ));
    }
}
