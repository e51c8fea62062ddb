pub mod catalog;
pub mod harvester;
pub mod ingest;
pub mod normalizer;
pub mod providers;
pub mod rate_limit;
pub mod slug;
pub mod watchlist;

pub use catalog::CatalogService;
pub use harvester::{HttpListingHarvester, ListingHarvester};
pub use ingest::{IngestReport, IngestService};
pub use normalizer::Normalizer;
pub use providers::{MetadataProvider, OmdbProvider};
pub use rate_limit::RateLimiter;
pub use watchlist::WatchlistService;
