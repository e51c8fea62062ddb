//! Movie metadata provider abstraction
//!
//! The normalizer only needs "give me the raw record for this imdb id", so
//! any source able to answer that (OMDB today) plugs in behind this trait.

use crate::{error::IngestError, models::OmdbRecord};

pub mod omdb;

pub use omdb::OmdbProvider;

/// Trait for metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the raw record for one title
    ///
    /// Fails with `NotFound` when the provider has no match and `Transport`
    /// when it cannot be reached. Neither is fatal to a batch.
    async fn fetch(&self, imdb_id: &str) -> Result<OmdbRecord, IngestError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
