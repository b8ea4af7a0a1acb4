// src/ingest/providers/github.rs
//! GitHub payload shapes shared by the trending and curated fetchers, plus URL helpers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GhRepo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub open_issues_count: u64,
}

impl GhRepo {
    /// `owner/repo` → `owner-repo`, used as slug and id key.
    pub fn dashed_name(&self) -> String {
        self.full_name.replacen('/', "-", 1)
    }

    /// Primary language as a zero- or one-element list.
    pub fn language_list(&self) -> Vec<String> {
        self.language
            .iter()
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

static RE_REPO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://(?:www\.)?github\.com/([^/?#\s]+)/([^/?#\s]+)").expect("repo url regex")
});

/// Normalized `https://github.com/<owner>/<repo>` from any GitHub link, if
/// the link names a repository.
pub fn extract_repo_url(link: &str) -> Option<String> {
    repo_path(link).map(|p| format!("https://github.com/{p}"))
}

/// `owner/repo` from a GitHub link, with a trailing `.git` removed.
pub fn repo_path(link: &str) -> Option<String> {
    let caps = RE_REPO_URL.captures(link)?;
    let owner = caps.get(1)?.as_str();
    let repo = caps.get(2)?.as_str();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("{owner}/{repo}"))
}

/// Date part of an ISO-8601 timestamp (`2025-01-02T..` → `2025-01-02`).
pub fn date_part(ts: &str) -> String {
    ts.split('T').next().unwrap_or_default().to_string()
}
