use crate::filter::Blacklist;
use crate::store::DEFAULT_STORE_PATH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable that overrides the configured API base URL
pub const API_URL_ENV: &str = "LISTING_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Settings of a harvest run that do not change between searches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Base URL of the classifieds API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Location of the JSON result store
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Flush the store after this many processed listings
    #[serde(default = "default_save_every")]
    pub save_every: usize,

    /// Keywords that flag a listing as blacklisted
    #[serde(default)]
    pub blacklist: Blacklist,

    /// Re-fetch listings stored as failed in an earlier run
    #[serde(default)]
    pub retry_failed: bool,

    /// Per-request timeout in seconds; transport defaults when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Default value for api_base_url
fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Default value for store_path
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Default value for save_every
fn default_save_every() -> usize {
    10
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            store_path: default_store_path(),
            save_every: default_save_every(),
            blacklist: Blacklist::default(),
            retry_failed: false,
            request_timeout_secs: None,
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply the API URL from the environment, if one is set
    pub fn with_env_overrides(self) -> Self {
        self.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(api_url) = api_url.filter(|url| !url.trim().is_empty()) {
            ::log::debug!("Using API base URL from {}: {}", API_URL_ENV, api_url);
            self.api_base_url = api_url;
        }
        self
    }

    /// Parsed API base URL; it must be absolute and able to carry a path
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.api_base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.api_base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("cannot carry a path".to_string()));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Search parameters of one harvest invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestQuery {
    pub query: String,
    pub location: String,
    pub radius: String,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub page_count: u32,
}

impl HarvestQuery {
    /// Query with a 5 km radius, no price bounds and a single result page
    pub fn new(query: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
            radius: "5".to_string(),
            min_price: None,
            max_price: None,
            page_count: 1,
        }
    }

    pub fn with_radius(mut self, radius: impl Into<String>) -> Self {
        self.radius = radius.into();
        self
    }

    pub fn with_price_range(mut self, min_price: Option<u64>, max_price: Option<u64>) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = HarvestConfig::from_json("{}").unwrap();
        assert_eq!(config, HarvestConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.store_path, PathBuf::from("results.json"));
        assert_eq!(config.save_every, 10);
        assert!(config.blacklist.is_empty());
        assert!(!config.retry_failed);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_full_config() {
        let config = HarvestConfig::from_json(
            r#"{
                "api_base_url": "http://api.internal:9000",
                "store_path": "data/bikes.json",
                "save_every": 25,
                "blacklist": ["Renn", "dame"],
                "retry_failed": true,
                "request_timeout_secs": 30
            }"#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "http://api.internal:9000");
        assert_eq!(config.store_path, PathBuf::from("data/bikes.json"));
        assert_eq!(config.save_every, 25);
        assert_eq!(config.blacklist.keywords(), ["renn".to_string(), "dame".to_string()]);
        assert!(config.retry_failed);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.json");
        fs::write(&path, r#"{"save_every": 3}"#).unwrap();
        assert_eq!(HarvestConfig::from_file(&path).unwrap().save_every, 3);

        assert!(matches!(
            HarvestConfig::from_file(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            HarvestConfig::from_json("{\"save_every\": \"ten\"}"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_api_url_override() {
        let config = HarvestConfig::default()
            .with_api_url_override(Some("http://other:1234".to_string()));
        assert_eq!(config.api_base_url, "http://other:1234");

        let config = HarvestConfig::default().with_api_url_override(Some("  ".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:8000");
    }

    #[test]
    fn test_api_url_validation() {
        let config = HarvestConfig::default();
        assert_eq!(config.api_url().unwrap().as_str(), "http://localhost:8000/");

        for bad in ["not a url", "mailto:someone@example.org", ""] {
            let config = HarvestConfig {
                api_base_url: bad.to_string(),
                ..HarvestConfig::default()
            };
            assert!(matches!(
                config.api_url(),
                Err(ConfigError::InvalidUrl { ref url, .. }) if url == bad
            ));
        }
    }

    #[test]
    fn test_query_builder() {
        let query = HarvestQuery::new("fahrrad", "80804")
            .with_radius("10")
            .with_price_range(Some(100), Some(400))
            .with_page_count(2);
        assert_eq!(query.radius, "10");
        assert_eq!(query.min_price, Some(100));
        assert_eq!(query.max_price, Some(400));
        assert_eq!(query.page_count, 2);
    }
}
