use crate::api::ApiError;
use crate::config::HarvestQuery;
use crate::results::{Candidate, DetailPayload};

/// The two read operations the harvest loop needs from the API.
///
/// Both are single-attempt: any failure is returned to the caller, which
/// decides how to recover.
#[allow(async_fn_in_trait)]
pub trait ListingSource {
    /// Search for listings matching `query`, in the order the API ranks them
    async fn fetch_candidates(&self, query: &HarvestQuery) -> Result<Vec<Candidate>, ApiError>;

    /// Fetch the detail payload of a single listing
    async fn fetch_detail(&self, id: &str) -> Result<DetailPayload, ApiError>;
}

impl<T: ListingSource + ?Sized> ListingSource for &T {
    async fn fetch_candidates(&self, query: &HarvestQuery) -> Result<Vec<Candidate>, ApiError> {
        (**self).fetch_candidates(query).await
    }

    async fn fetch_detail(&self, id: &str) -> Result<DetailPayload, ApiError> {
        (**self).fetch_detail(id).await
    }
}
