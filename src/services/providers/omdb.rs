//! OMDB API provider
//!
//! One GET per title: the configured URL template is expanded with the imdb
//! id and API key. OMDB answers 200 even for unknown ids and flags the miss
//! with `"Response": "False"`.

use crate::{
    config::OmdbConfig,
    db::{Cache, CacheKey},
    error::IngestError,
    models::OmdbRecord,
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;

const RECORD_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    config: OmdbConfig,
    cache: Option<Cache>,
}

impl OmdbProvider {
    pub fn new(config: OmdbConfig, cache: Option<Cache>) -> Result<Self, IngestError> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IngestError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            cache,
        })
    }

    async fn cached(&self, imdb_id: &str) -> Option<OmdbRecord> {
        let cache = self.cache.as_ref()?;
        match cache.get(&CacheKey::OmdbRecord(imdb_id.to_string())).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(imdb_id = %imdb_id, error = %e, "OMDB cache read failed");
                None
            }
        }
    }

    async fn request(&self, imdb_id: &str) -> Result<OmdbRecord, IngestError> {
        let url = self.config.url_for(imdb_id);
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Transport(format!(
                "OMDB returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let record: OmdbRecord = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(imdb_id = %imdb_id, error = %e, "Failed to deserialize OMDB response");
            IngestError::MalformedData(format!("unreadable OMDB response: {}", e))
        })?;

        Ok(record)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbProvider {
    async fn fetch(&self, imdb_id: &str) -> Result<OmdbRecord, IngestError> {
        if let Some(record) = self.cached(imdb_id).await {
            tracing::debug!(imdb_id = %imdb_id, "OMDB cache hit");
            return Ok(record);
        }

        let record = self.request(imdb_id).await.map_err(|e| {
            tracing::warn!(imdb_id = %imdb_id, error = %e, provider = "omdb", "Fetch failed");
            e
        })?;

        if !record.is_found() {
            tracing::info!(
                imdb_id = %imdb_id,
                reason = record.error.as_deref().unwrap_or("unknown"),
                "Title not found at OMDB"
            );
            return Err(IngestError::NotFound(imdb_id.to_string()));
        }

        if let Some(cache) = &self.cache {
            cache.set_in_background(
                &CacheKey::OmdbRecord(imdb_id.to_string()),
                &record,
                RECORD_CACHE_TTL,
            );
        }

        tracing::info!(imdb_id = %imdb_id, provider = "omdb", "Title fetched");
        Ok(record)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
