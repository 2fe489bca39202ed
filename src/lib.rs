// Re-export modules
pub mod api;
pub mod config;
pub mod filter;
pub mod harvest;
pub mod observer;
pub mod results;
pub mod store;
pub mod utils;
pub mod viewer;

// Re-export commonly used types for convenience
pub use api::{ApiError, HttpListingSource, ListingSource};
pub use config::{HarvestConfig, HarvestQuery};
pub use filter::{Blacklist, is_blacklisted};
pub use harvest::{HarvestError, Harvester};
pub use observer::{HarvestEvent, HarvestObserver, LogObserver};
pub use results::{Candidate, HarvestSummary, ListingRecord};
pub use store::{ResultStore, StoreError};

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Run a harvest against the HTTP API described by `config`.
///
/// `interrupt` is polled between requests; once it is set the run saves
/// what it has and returns `HarvestError::Interrupted`.
pub async fn harvest(
    config: &HarvestConfig,
    query: &HarvestQuery,
    interrupt: Arc<AtomicBool>,
) -> Result<HarvestSummary, HarvestError> {
    let source = HttpListingSource::from_url(config.api_url()?, config.request_timeout())
        .map_err(HarvestError::Client)?;

    ::log::info!("Harvesting '{}' around {}", query.query, query.location);

    Harvester::new(source)
        .with_config(config)
        .with_interrupt(interrupt)
        .run(query)
        .await
}
