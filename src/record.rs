//! record.rs: the normalized unit every source maps into.
//!
//! Records are plain values: built once by a normalizer, then only filtered
//! or cloned. JSON uses camelCase to match what the card grid consumes.

use serde::{Deserialize, Serialize};

/// Where a record came from. Serialized as the selector string the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// YC directory, open-source list.
    YcOss,
    /// YC directory, full company list.
    YcAll,
    /// Curated roster of verified YC orgs, resolved via GitHub.
    YcVerified,
    Hackernews,
    GithubTrending,
}

impl Source {
    /// Prefix used to namespace record ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Source::YcOss => "yc_oss",
            Source::YcAll => "yc",
            Source::YcVerified => "yc_verified",
            Source::Hackernews => "hn",
            Source::GithubTrending => "trending",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::YcOss => "yc_oss",
            Source::YcAll => "yc_all",
            Source::YcVerified => "yc_verified",
            Source::Hackernews => "hackernews",
            Source::GithubTrending => "github_trending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub languages: Vec<String>,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
}

impl Record {
    /// Start a record with the namespaced id; everything else empty.
    pub fn new(source: Source, key: &str, name: impl Into<String>) -> Self {
        Self {
            id: format!("{}:{}", source.id_prefix(), key),
            name: name.into(),
            slug: String::new(),
            description: String::new(),
            website: None,
            github_url: None,
            batch: String::new(),
            tags: Vec::new(),
            stars: 0,
            languages: Vec::new(),
            source,
            last_activity: None,
        }
    }

    /// Link a card should open: the repository if known, else the website.
    pub fn primary_link(&self) -> Option<&str> {
        self.github_url.as_deref().or(self.website.as_deref())
    }

    /// Whether the record points at a repository someone could contribute to.
    pub fn is_contributable(&self) -> bool {
        self.github_url.is_some()
    }

    /// Case-insensitive exact match against the record's languages.
    /// Folds case the same way as `matches_search`.
    pub fn has_language(&self, language: &str) -> bool {
        let wanted = language.to_lowercase();
        self.languages.iter().any(|l| l.to_lowercase() == wanted)
    }

    /// Case-insensitive substring match over name, description and tags.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// Lowercase and join whitespace runs with `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Treat empty / whitespace-only upstream strings as absent.
pub fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
