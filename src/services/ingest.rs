//! Batch ingestion of titles into the catalog.
//!
//! A batch is strictly sequential: each id waits for the rate limiter, is
//! fetched and normalized, then stored with all of its joins in one
//! transaction. A failing id is logged and skipped; it never stops the batch.

use std::{collections::BTreeSet, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::MovieStore,
    error::IngestError,
    models::NewMovie,
    services::{harvester::ListingHarvester, normalizer::Normalizer, rate_limit::RateLimiter},
};

/// Outcome of one batch
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub added: Vec<String>,
    /// Ids that were not stored, with the reason
    pub skipped: Vec<(String, String)>,
}

pub struct IngestService {
    normalizer: Normalizer,
    store: Arc<dyn MovieStore>,
    harvester: Arc<dyn ListingHarvester>,
    limiter: RateLimiter,
}

impl IngestService {
    pub fn new(
        normalizer: Normalizer,
        store: Arc<dyn MovieStore>,
        harvester: Arc<dyn ListingHarvester>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            normalizer,
            store,
            harvester,
            limiter,
        }
    }

    /// Ingests every id on the listing page that is not stored yet
    pub async fn ingest_from_url(&self, url: &str) -> Result<IngestReport, IngestError> {
        let candidates = self.harvester.candidate_ids(url).await?;
        let existing = self.store.existing_imdb_ids().await?;

        let to_add: BTreeSet<String> = candidates
            .into_iter()
            .filter(|id| !existing.contains(id))
            .collect();

        tracing::info!(
            url = %url,
            new = to_add.len(),
            already_stored = existing.len(),
            "Starting ingestion from listing"
        );

        Ok(self.ingest_ids(to_add).await)
    }

    /// Processes `ids` one at a time in iteration order
    pub async fn ingest_ids(&self, ids: impl IntoIterator<Item = String>) -> IngestReport {
        let mut report = IngestReport::default();

        for imdb_id in ids {
            self.limiter.acquire().await;

            match self.ingest_one(&imdb_id).await {
                Ok(()) => {
                    tracing::info!(imdb_id = %imdb_id, "Added movie to catalog");
                    report.added.push(imdb_id);
                }
                Err(e) => {
                    tracing::error!(imdb_id = %imdb_id, error = %e, "Failed to add movie");
                    report.skipped.push((imdb_id, e.to_string()));
                }
            }
        }

        tracing::info!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            "Ingestion batch finished"
        );
        report
    }

    async fn ingest_one(&self, imdb_id: &str) -> Result<(), IngestError> {
        let normalized = self.normalizer.get_data(imdb_id).await?;
        let movie = NewMovie::try_from(normalized).map_err(IngestError::MalformedData)?;
        self.store.insert_movie(movie).await?;
        Ok(())
    }

    /// Runs `ingest_from_url` on the runtime and returns a job id for the logs
    pub fn spawn_from_url(self: &Arc<Self>, url: String) -> Uuid {
        let job_id = Uuid::new_v4();
        let service = Arc::clone(self);

        tokio::spawn(async move {
            tracing::info!(job_id = %job_id, url = %url, "Ingestion job started");
            match service.ingest_from_url(&url).await {
                Ok(report) => tracing::info!(
                    job_id = %job_id,
                    added = report.added.len(),
                    skipped = report.skipped.len(),
                    "Ingestion job completed"
                ),
                Err(e) => tracing::error!(job_id = %job_id, error = %e, "Ingestion job failed"),
            }
        });

        job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{OmdbRating, OmdbRecord},
        services::providers::MockMetadataProvider,
    };
    use std::time::Duration;

    struct StaticHarvester(Vec<&'static str>);

    #[async_trait::async_trait]
    impl ListingHarvester for StaticHarvester {
        async fn candidate_ids(&self, _url: &str) -> Result<BTreeSet<String>, IngestError> {
            Ok(self.0.iter().map(|id| id.to_string()).collect())
        }
    }

    fn record(imdb_id: &str) -> OmdbRecord {
        OmdbRecord {
            title: Some(format!("Movie {}", imdb_id)),
            released: Some("01 Jul 2021".to_string()),
            runtime: Some("115 min".to_string()),
            genre: Some("Crime, Drama".to_string()),
            director: Some("Steven Soderbergh".to_string()),
            actors: Some("Don Cheadle, David Harbour".to_string()),
            plot: Some("A heist.".to_string()),
            poster: Some("www.poster.jpg".to_string()),
            ratings: Some(vec![OmdbRating {
                source: "Metacritic".to_string(),
                value: "76/100".to_string(),
            }]),
            imdb_id: Some(imdb_id.to_string()),
            response: Some("True".to_string()),
            ..Default::default()
        }
    }

    fn service(
        provider: MockMetadataProvider,
        store: MemoryStore,
        listing: Vec<&'static str>,
    ) -> IngestService {
        IngestService::new(
            Normalizer::new(Arc::new(provider)),
            Arc::new(store),
            Arc::new(StaticHarvester(listing)),
            RateLimiter::new(Duration::ZERO, Duration::ZERO),
        )
    }

    fn provider_missing(missing: &'static str) -> MockMetadataProvider {
        let mut provider = MockMetadataProvider::new();
        provider.expect_fetch().returning(move |id| {
            if id == missing {
                Err(IngestError::NotFound(id.to_string()))
            } else {
                Ok(record(id))
            }
        });
        provider.expect_name().return_const("mock");
        provider
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let store = MemoryStore::new();
        let service = service(provider_missing("tt0000002"), store.clone(), vec![]);

        let report = service
            .ingest_ids(["tt0000001", "tt0000002", "tt0000003"].map(String::from))
            .await;

        assert_eq!(report.added, vec!["tt0000001", "tt0000003"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "tt0000002");
        assert_eq!(store.existing_imdb_ids().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stored_movie_has_slug_and_joins() {
        let store = MemoryStore::new();
        let service = service(provider_missing("none"), store.clone(), vec![]);

        service.ingest_ids(vec!["tt0000001".to_string()]).await;

        let movie = store.movie_by_imdb_id("tt0000001").await.unwrap().unwrap();
        assert!(movie.slug.contains("-movie-tt0000001"));
        assert_eq!(movie.genres.len(), 2);
        assert_eq!(movie.actors.len(), 2);
        assert_eq!(movie.reviews.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_from_url_skips_stored_ids() {
        let store = MemoryStore::new();
        let first = service(provider_missing("none"), store.clone(), vec![]);
        first.ingest_ids(vec!["tt0000001".to_string()]).await;

        let mut provider = MockMetadataProvider::new();
        provider
            .expect_fetch()
            .withf(|id| !id.ends_with("0001"))
            .times(2)
            .returning(|id| Ok(record(id)));
        provider.expect_name().return_const("mock");

        let second = service(
            provider,
            store.clone(),
            vec!["tt0000003", "tt0000001", "tt0000002"],
        );
        let report = tokio_test::assert_ok!(second.ingest_from_url("http://listing.local").await);

        assert_eq!(report.added, vec!["tt0000002", "tt0000003"]);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_record_is_skipped() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_fetch().returning(|id| {
            let mut raw = record(id);
            raw.released = Some("N/A".to_string());
            Ok(raw)
        });
        provider.expect_name().return_const("mock");

        let store = MemoryStore::new();
        let service = service(provider, store.clone(), vec![]);
        let report = service.ingest_ids(vec!["tt0000001".to_string()]).await;

        assert!(report.added.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(store.all_movies().await.unwrap().is_empty());
    }
}
