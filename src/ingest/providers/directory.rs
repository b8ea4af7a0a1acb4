// src/ingest/providers/directory.rs
//! YC company directory (yc-oss JSON API). Two lists share one payload shape:
//! the open-source subset and the full directory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::batch::extract_year;
use crate::config::AppConfig;
use crate::ingest::http::HttpClient;
use crate::ingest::types::{Capabilities, FetchParams, SourceFetcher};
use crate::record::{non_empty, slugify, Record, Source};

#[derive(Debug, Clone, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub one_liner: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Company {
    fn has_repo(&self) -> bool {
        self.github.as_deref().is_some_and(|g| !g.trim().is_empty())
    }

    fn is_live(&self) -> bool {
        matches!(self.status.as_deref(), Some("Active") | Some("Public"))
    }

    fn key(&self) -> String {
        non_empty(self.slug.clone())
            .unwrap_or_else(|| slugify(self.name.as_deref().unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryVariant {
    /// `open-source.json`, with a README fallback.
    OpenSource,
    /// `all.json`, year-floored and capped.
    All,
}

impl DirectoryVariant {
    fn source(self) -> Source {
        match self {
            DirectoryVariant::OpenSource => Source::YcOss,
            DirectoryVariant::All => Source::YcAll,
        }
    }

    fn file(self) -> &'static str {
        match self {
            DirectoryVariant::OpenSource => "open-source.json",
            DirectoryVariant::All => "all.json",
        }
    }
}

pub struct DirectoryFetcher {
    http: HttpClient,
    variant: DirectoryVariant,
    base: String,
    readme_url: String,
    cap: usize,
    default_min_year: i32,
}

impl DirectoryFetcher {
    pub fn new(http: HttpClient, cfg: &AppConfig, variant: DirectoryVariant) -> Self {
        Self {
            http,
            variant,
            base: cfg.upstream.directory_base.trim_end_matches('/').to_string(),
            readme_url: cfg.upstream.readme_fallback_url.clone(),
            cap: cfg.limits.directory_cap,
            default_min_year: cfg.years.directory_min_year,
        }
    }

    pub fn open_source(http: HttpClient, cfg: &AppConfig) -> Self {
        Self::new(http, cfg, DirectoryVariant::OpenSource)
    }

    pub fn all(http: HttpClient, cfg: &AppConfig) -> Self {
        Self::new(http, cfg, DirectoryVariant::All)
    }

    async fn fetch_companies(&self) -> Result<Vec<Company>> {
        let url = format!("{}/{}", self.base, self.variant.file());
        self.http
            .get_json(&url)
            .await
            .with_context(|| format!("yc directory {}", self.variant.file()))
    }

    async fn fetch_readme(&self) -> Result<Vec<Record>> {
        let md = self
            .http
            .get_text(&self.readme_url)
            .await
            .context("open-source companies readme")?;
        Ok(parse_readme(&md))
    }
}

/// Map a directory company; `None` when it has no repository link.
pub fn normalize_company(c: Company, source: Source) -> Option<Record> {
    if !c.has_repo() {
        return None;
    }
    let key = c.key();
    let mut r = Record::new(source, &key, c.name.unwrap_or_default());
    r.slug = c.slug.unwrap_or_default();
    r.description = non_empty(c.one_liner)
        .or_else(|| non_empty(c.long_description))
        .unwrap_or_default();
    r.website = non_empty(c.website);
    r.github_url = non_empty(c.github);
    r.batch = c.batch.unwrap_or_default();
    r.tags = c.tags;
    if source == Source::YcOss {
        r.tags.push("open-source".to_string());
    }
    Some(r)
}

/// Apply the variant's filters to a decoded company list.
pub fn select_companies(
    companies: Vec<Company>,
    variant: DirectoryVariant,
    min_year: Option<i32>,
    cap: usize,
) -> Vec<Record> {
    let source = variant.source();
    let mut out = Vec::new();
    for c in companies {
        if !c.has_repo() || !c.is_live() {
            continue;
        }
        if let Some(min) = min_year {
            let year = c.batch.as_deref().and_then(extract_year);
            if !year.is_some_and(|y| y >= min) {
                continue;
            }
        }
        if let Some(r) = normalize_company(c, source) {
            out.push(r);
        }
        if variant == DirectoryVariant::All && out.len() >= cap {
            break;
        }
    }
    out
}

static RE_README_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*\[([^\]]+)\]\(([^)]+)\)\s*\|\s*([^|]*)\s*\|\s*\[GitHub\]\(([^)]+)\)")
        .expect("readme row regex")
});

/// Rows of the open-source README table:
/// `| [Name](website) | description | [GitHub](repo) |`.
pub fn parse_readme(markdown: &str) -> Vec<Record> {
    RE_README_ROW
        .captures_iter(markdown)
        .map(|caps| {
            let name = caps[1].trim().to_string();
            let slug = slugify(&name);
            let mut r = Record::new(Source::YcOss, &slug, name);
            r.slug = slug;
            r.description = caps[3].trim().to_string();
            r.website = non_empty(Some(caps[2].to_string()));
            r.github_url = non_empty(Some(caps[4].to_string()));
            r.tags = vec!["open-source".to_string()];
            r
        })
        .collect()
}

#[async_trait]
impl SourceFetcher for DirectoryFetcher {
    async fn fetch(&self, params: &FetchParams) -> Result<Vec<Record>> {
        match self.variant {
            DirectoryVariant::OpenSource => match self.fetch_companies().await {
                Ok(companies) => {
                    let raw = companies.len();
                    let out = select_companies(companies, self.variant, None, usize::MAX);
                    tracing::info!(target: "ingest", source = "yc_oss", raw, count = out.len(), "open-source companies");
                    Ok(out)
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, "yc_oss api failed, trying readme");
                    let out = self
                        .fetch_readme()
                        .await
                        .with_context(|| format!("api failed ({e:#}); readme fallback failed"))?;
                    tracing::info!(target: "ingest", source = "yc_oss", count = out.len(), "readme fallback");
                    Ok(out)
                }
            },
            DirectoryVariant::All => {
                let companies = self.fetch_companies().await?;
                let raw = companies.len();
                let min_year = params.min_year.unwrap_or(self.default_min_year);
                let cap = params.limit.unwrap_or(self.cap).min(self.cap);
                let out = select_companies(companies, self.variant, Some(min_year), cap);
                tracing::info!(target: "ingest", source = "yc_all", raw, min_year, count = out.len(), "directory companies");
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.variant.source().as_str()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            language_at_source: false,
            new_only_at_source: self.variant == DirectoryVariant::All,
        }
    }
}
