use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::{MemoryStore, MovieStore, WatchlistStore},
    services::{
        CatalogService, HttpListingHarvester, IngestService, ListingHarvester, MetadataProvider,
        Normalizer, RateLimiter, WatchlistService,
    },
};

use super::auth::JwtVerifier;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub watchlist: WatchlistService,
    pub ingest: Arc<IngestService>,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        watchlists: Arc<dyn WatchlistStore>,
        ingest: IngestService,
        jwt: JwtVerifier,
    ) -> Self {
        Self {
            catalog: CatalogService::new(Arc::clone(&movies), Arc::clone(&watchlists)),
            watchlist: WatchlistService::new(movies, watchlists),
            ingest: Arc::new(ingest),
            jwt: Arc::new(jwt),
        }
    }

    /// State over an in-memory store, for tests and local runs without Postgres
    pub fn in_memory(
        store: MemoryStore,
        provider: Arc<dyn MetadataProvider>,
        jwt_secret: &str,
    ) -> Self {
        let movies: Arc<dyn MovieStore> = Arc::new(store.clone());
        let watchlists: Arc<dyn WatchlistStore> = Arc::new(store);
        let harvester: Arc<dyn ListingHarvester> = Arc::new(HttpListingHarvester::default());

        let ingest = IngestService::new(
            Normalizer::new(provider),
            Arc::clone(&movies),
            harvester,
            RateLimiter::new(Duration::ZERO, Duration::ZERO),
        );

        Self::new(movies, watchlists, ingest, JwtVerifier::new(jwt_secret))
    }
}
