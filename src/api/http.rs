use crate::api::{ApiError, ListingSource};
use crate::config::HarvestQuery;
use crate::results::{Candidate, DetailPayload};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const SEARCH_PATH: &str = "inserate";
const DETAIL_PATH: &str = "inserat";

/// Envelope shared by the search and detail responses
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

/// `ListingSource` backed by the classifieds HTTP API
#[derive(Debug, Clone)]
pub struct HttpListingSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpListingSource {
    /// Create a client for the API at `base_url`, using transport default timeouts
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an optional per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Request(format!("invalid base URL '{}': {}", base_url, e)))?;
        Self::from_url(base_url, timeout)
    }

    /// Create a client for an already parsed base URL
    pub fn from_url(base_url: Url, timeout: Option<Duration>) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Request(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_envelope(&self, url: Url, params: &[(&str, String)]) -> Result<Envelope, ApiError> {
        ::log::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Request(format!("{} returned HTTP {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

/// Query string of a search request; absent price bounds are left out
fn search_params(query: &HarvestQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("query", query.query.clone()),
        ("location", query.location.clone()),
        ("radius", query.radius.clone()),
    ];
    if let Some(min_price) = query.min_price {
        params.push(("min_price", min_price.to_string()));
    }
    if let Some(max_price) = query.max_price {
        params.push(("max_price", max_price.to_string()));
    }
    params.push(("page_count", query.page_count.to_string()));
    params
}

impl ListingSource for HttpListingSource {
    async fn fetch_candidates(&self, query: &HarvestQuery) -> Result<Vec<Candidate>, ApiError> {
        let url = self.endpoint(&[SEARCH_PATH]);
        let envelope = self.get_envelope(url, &search_params(query)).await?;

        if !envelope.success {
            return Err(ApiError::EmptyResult);
        }
        match envelope.data {
            None | Some(Value::Null) => Err(ApiError::EmptyResult),
            Some(data) => serde_json::from_value(data)
                .map_err(|e| ApiError::Malformed(format!("search data: {}", e))),
        }
    }

    async fn fetch_detail(&self, id: &str) -> Result<DetailPayload, ApiError> {
        let url = self.endpoint(&[DETAIL_PATH, id]);
        let envelope = self.get_envelope(url, &[]).await?;

        if !envelope.success {
            return Err(ApiError::EmptyResult);
        }
        match envelope.data {
            Some(Value::Object(data)) => Ok(data),
            Some(_) => Err(ApiError::Malformed("detail data is not an object".to_string())),
            None => Err(ApiError::Malformed("detail data missing".to_string())),
        }
    }
}
