//! Access to the classifieds API.
//!
//! `ListingSource` is what the harvest loop talks to; `HttpListingSource` is
//! the implementation backed by the real HTTP service.

pub mod http;
pub mod source;

pub use http::HttpListingSource;
pub use source::ListingSource;

use thiserror::Error;

/// Failures of a single API request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Transport failure or non-success HTTP status
    #[error("request failed: {0}")]
    Request(String),

    /// Well-formed response without a success flag or without data
    #[error("API reported no result")]
    EmptyResult,

    /// Response body is missing expected fields
    #[error("malformed payload: {0}")]
    Malformed(String),
}
