// src/ingest/providers/trending.rs
//! GitHub "trending": repositories created in the last N days, most starred first.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::config::AppConfig;
use crate::ingest::http::HttpClient;
use crate::ingest::providers::github::{date_part, GhRepo, SearchResponse};
use crate::ingest::types::{Capabilities, FetchParams, SourceFetcher};
use crate::record::{non_empty, Record, Source};

pub struct TrendingFetcher {
    http: HttpClient,
    api_base: String,
    window_days: i64,
    min_stars: u64,
    default_limit: usize,
}

impl TrendingFetcher {
    pub fn new(http: HttpClient, cfg: &AppConfig) -> Self {
        Self {
            http,
            api_base: cfg.upstream.github_api_base.trim_end_matches('/').to_string(),
            window_days: cfg.trending.window_days,
            min_stars: cfg.trending.min_stars,
            default_limit: cfg.limits.trending,
        }
    }
}

/// Search qualifier string, e.g. `created:>2025-01-01 stars:>50 language:Rust`.
pub fn build_query(now: DateTime<Utc>, window_days: i64, min_stars: u64, language: Option<&str>) -> String {
    let since = (now - Duration::days(window_days)).format("%Y-%m-%d");
    let mut q = format!("created:>{since} stars:>{min_stars}");
    if let Some(lang) = language.map(str::trim).filter(|l| !l.is_empty()) {
        q.push_str(" language:");
        q.push_str(lang);
    }
    q
}

/// Map one search hit into a record.
pub fn normalize_repo(repo: GhRepo) -> Record {
    let key = repo.dashed_name();
    let languages = repo.language_list();
    let mut r = Record::new(Source::GithubTrending, &key, repo.name);
    r.slug = key;
    r.description = repo.description.unwrap_or_default();
    r.website = non_empty(repo.homepage).or_else(|| Some(repo.html_url.clone()));
    r.github_url = Some(repo.html_url);
    r.batch = repo.created_at.as_deref().map(date_part).unwrap_or_default();
    r.tags = repo.topics;
    r.stars = repo.stargazers_count;
    r.languages = languages;
    r.last_activity = repo.pushed_at;
    r
}

#[async_trait]
impl SourceFetcher for TrendingFetcher {
    async fn fetch(&self, params: &FetchParams) -> Result<Vec<Record>> {
        let per_page = params.limit.unwrap_or(self.default_limit).clamp(1, 100);
        let q = build_query(
            Utc::now(),
            self.window_days,
            self.min_stars,
            params.language.as_deref(),
        );
        let per_page = per_page.to_string();
        let url = format!("{}/search/repositories", self.api_base);
        let body: SearchResponse<GhRepo> = self
            .http
            .get_json_with(
                &url,
                &[
                    ("q", q.as_str()),
                    ("sort", "stars"),
                    ("order", "desc"),
                    ("per_page", per_page.as_str()),
                ],
            )
            .await
            .context("github repository search")?;

        let out: Vec<Record> = body.items.into_iter().map(normalize_repo).collect();
        tracing::info!(target: "ingest", source = "github_trending", count = out.len(), "trending repos");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "github_trending"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            language_at_source: true,
            new_only_at_source: false,
        }
    }
}
