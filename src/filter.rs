use serde::{Deserialize, Serialize};

/// Returns true if any keyword appears in the title or description.
///
/// Matching is a case-insensitive substring check, so `"renn"` matches
/// `"Rennrad"`. An empty keyword list never matches.
pub fn is_blacklisted<S: AsRef<str>>(title: &str, description: &str, keywords: &[S]) -> bool {
    let text = format!("{}\n{}", title, description).to_lowercase();
    keywords
        .iter()
        .any(|keyword| text.contains(&keyword.as_ref().to_lowercase()))
}

/// Keyword blacklist applied to listing titles and descriptions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Blacklist {
    keywords: Vec<String>,
}

impl Blacklist {
    /// Create a blacklist from raw keywords.
    ///
    /// Keywords are lower-cased once here. Blank keywords are dropped, they
    /// would match every listing.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().to_lowercase())
            .filter(|keyword| !keyword.trim().is_empty())
            .collect();
        Self { keywords }
    }

    /// Lower-cased keywords in their original order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Merge additional keywords, skipping ones already present
    pub fn extend<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in Blacklist::new(keywords).keywords {
            if !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
    }

    /// First keyword found in the listing text, if any
    pub fn matching_keyword(&self, title: &str, description: &str) -> Option<&str> {
        let text = format!("{}\n{}", title, description).to_lowercase();
        self.keywords
            .iter()
            .find(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
    }

    /// Determine if a listing should be flagged
    pub fn matches(&self, title: &str, description: &str) -> bool {
        self.matching_keyword(title, description).is_some()
    }
}

impl From<Vec<String>> for Blacklist {
    fn from(keywords: Vec<String>) -> Self {
        Blacklist::new(keywords)
    }
}

impl From<Blacklist> for Vec<String> {
    fn from(blacklist: Blacklist) -> Self {
        blacklist.keywords
    }
}
