use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client as HttpClient;

use crate::error::IngestError;

static IMDB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").expect("valid imdb id pattern"));

/// Source of candidate imdb ids for a batch
#[async_trait::async_trait]
pub trait ListingHarvester: Send + Sync {
    async fn candidate_ids(&self, url: &str) -> Result<BTreeSet<String>, IngestError>;
}

/// Downloads a listing page and scrapes every imdb id out of it
#[derive(Clone, Default)]
pub struct HttpListingHarvester {
    http_client: HttpClient,
}

impl HttpListingHarvester {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait::async_trait]
impl ListingHarvester for HttpListingHarvester {
    async fn candidate_ids(&self, url: &str) -> Result<BTreeSet<String>, IngestError> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::Transport(format!(
                "listing {} returned status {}",
                url,
                response.status()
            )));
        }

        let page = response.text().await?;
        let ids = extract_imdb_ids(&page);
        tracing::info!(url = %url, count = ids.len(), "Harvested candidate ids");
        Ok(ids)
    }
}

/// Every distinct `tt\d+` token in the page, in sorted order
pub fn extract_imdb_ids(page: &str) -> BTreeSet<String> {
    IMDB_ID
        .find_iter(page)
        .map(|m| m.as_str().to_string())
        .collect()
}
