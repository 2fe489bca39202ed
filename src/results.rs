use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Raw `data` object of a successful detail response
pub type DetailPayload = Map<String, Value>;

/// A search hit: the listing identifier and the URL of its public page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Listing identifier, unique per listing
    pub adid: String,

    /// URL of the listing page
    pub url: String,
}

impl Candidate {
    /// Create a new candidate
    pub fn new(adid: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            adid: adid.into(),
            url: url.into(),
        }
    }
}

/// Asking price as reported by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    /// `{"amount": ..., "currency": ...}`
    Structured(PriceAmount),
    /// A bare number
    Raw(serde_json::Number),
    /// Anything else, kept verbatim
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceAmount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Price {
    /// Interpret a stored `price` value; shapes that fit nothing else become `Other`
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| Price::Other(value.clone()))
    }

    /// Human readable amount, with the currency when one is given
    pub fn display(&self) -> String {
        match self {
            Price::Structured(price) => {
                let amount = price.amount.as_ref().map(value_text).unwrap_or_default();
                match &price.currency {
                    Some(currency) if !amount.is_empty() => format!("{} {}", amount, currency),
                    _ => amount,
                }
            }
            Price::Raw(number) => number.to_string(),
            Price::Other(value) => value_text(value),
        }
    }
}

/// One entry of the result store.
///
/// A successful record is the detail payload exactly as the API sent it,
/// plus the listing `url` and the two flags. Nothing in the payload is
/// validated beyond it being an object; the accessors below read the fields
/// they know and fall back to empty values for anything of another shape.
/// A failed placeholder only carries the flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(default)]
    pub blacklisted: bool,

    #[serde(default)]
    pub failed: bool,

    #[serde(flatten)]
    pub data: DetailPayload,
}

impl ListingRecord {
    /// Placeholder stored for a listing whose detail could not be fetched
    pub fn failed() -> Self {
        Self {
            failed: true,
            ..Self::default()
        }
    }

    /// Build a record from a detail payload and the listing URL of its search hit.
    ///
    /// `blacklisted` is left unset; classification is the caller's job.
    pub fn from_detail(mut payload: DetailPayload, url: &str) -> Self {
        payload.remove("blacklisted");
        payload.remove("failed");
        payload.insert("url".to_string(), Value::String(url.to_string()));
        Self {
            blacklisted: false,
            failed: false,
            data: payload,
        }
    }

    pub fn title(&self) -> &str {
        self.str_field("title").unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.str_field("description").unwrap_or("")
    }

    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    pub fn price(&self) -> Option<Price> {
        self.field("price").map(Price::from_value)
    }

    /// City of `location`; a plain string location is taken as the city
    pub fn city(&self) -> &str {
        match self.field("location") {
            Some(Value::String(city)) => city.as_str(),
            Some(location) => location.get("city").and_then(Value::as_str).unwrap_or(""),
            None => "",
        }
    }

    /// Upload date as text, whatever JSON type the API used for it
    pub fn upload_date(&self) -> Option<String> {
        self.field("upload_date").map(value_text)
    }

    /// First image reference, either a URL string or an object with a `url`
    pub fn first_image(&self) -> Option<String> {
        let first = match self.field("images")? {
            Value::Array(images) => images.first()?,
            other => other,
        };
        let image = match first {
            Value::Object(image) => image.get("url").map(value_text),
            other => Some(value_text(other)),
        };
        image.filter(|image| !image.is_empty())
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|value| !value.is_null())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }
}

/// A listing handled during the current run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedListing {
    pub id: String,
    pub record: ListingRecord,
}

/// What a completed harvest run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestSummary {
    /// Newly stored listings that passed the blacklist
    pub new_processed: Vec<ProcessedListing>,

    /// Newly stored listings that matched the blacklist
    pub blacklisted: Vec<ProcessedListing>,

    /// Identifiers stored as failed placeholders in this run
    pub failed: Vec<String>,

    /// Candidates skipped because the store already knew them
    pub skipped: usize,

    /// Location of the result store
    pub results_json_file: PathBuf,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
