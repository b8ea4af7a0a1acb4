// src/ingest/providers/hackernews.rs
//! Show HN posts that link to a GitHub repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::ingest::clean_text;
use crate::ingest::http::HttpClient;
use crate::ingest::providers::github::extract_repo_url;
use crate::ingest::types::{FetchParams, SourceFetcher};
use crate::record::{Record, Source};

#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<u64>,
    /// Unix seconds.
    #[serde(default)]
    pub time: Option<i64>,
}

pub struct HackerNewsFetcher {
    http: HttpClient,
    api_base: String,
    default_limit: usize,
    window: usize,
}

impl HackerNewsFetcher {
    pub fn new(http: HttpClient, cfg: &AppConfig) -> Self {
        Self {
            http,
            api_base: cfg.upstream.hn_api_base.trim_end_matches('/').to_string(),
            default_limit: cfg.limits.hackernews,
            window: cfg.limits.hackernews_window,
        }
    }

    async fn item(&self, id: u64) -> Result<Option<HnItem>> {
        let url = format!("{}/item/{id}.json", self.api_base);
        self.http.get_json(&url).await
    }
}

static RE_SHOW_HN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*show\s+hn\s*:\s*").expect("show hn regex"));
// En/em dash anywhere, or a hyphen with whitespace on both sides.
static RE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[–—].*$|\s+-\s.*$").expect("suffix regex"));

/// Display name from a post title: prefix and tagline removed.
pub fn clean_title(title: &str) -> String {
    let t = clean_text(title);
    let t = RE_SHOW_HN.replace(&t, "");
    RE_SUFFIX.replace(&t, "").trim().to_string()
}

/// Record for a post, or `None` if it doesn't point at a GitHub repository.
pub fn normalize_item(item: HnItem) -> Option<Record> {
    let link = item.url.filter(|u| u.contains("github.com"))?;
    let github_url = extract_repo_url(&link)?;
    let title = clean_text(item.title.as_deref().unwrap_or_default());
    let posted: Option<DateTime<Utc>> = item.time.and_then(|t| DateTime::from_timestamp(t, 0));

    let mut r = Record::new(Source::Hackernews, &item.id.to_string(), clean_title(&title));
    r.slug = format!("hn-{}", item.id);
    r.description = title;
    r.website = Some(link);
    r.github_url = Some(github_url);
    r.batch = posted
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    r.tags = vec!["hackernews".to_string(), "show-hn".to_string()];
    r.stars = item.score.unwrap_or(0);
    r.last_activity = posted.map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
    Some(r)
}

#[async_trait]
impl SourceFetcher for HackerNewsFetcher {
    async fn fetch(&self, params: &FetchParams) -> Result<Vec<Record>> {
        let limit = params.limit.unwrap_or(self.default_limit);
        let url = format!("{}/showstories.json", self.api_base);
        let ids: Vec<u64> = self
            .http
            .get_json(&url)
            .await
            .context("show hn story index")?;

        let attempts = limit.saturating_mul(2).min(self.window);
        let mut out = Vec::with_capacity(limit);
        for id in ids.into_iter().take(attempts) {
            if out.len() >= limit {
                break;
            }
            match self.item(id).await {
                Ok(Some(item)) => {
                    if let Some(r) = normalize_item(item) {
                        out.push(r);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "ingest", id, error = %e, "skipping hn item");
                }
            }
        }

        tracing::info!(target: "ingest", source = "hackernews", count = out.len(), "projects with github links");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "hackernews"
    }
}
