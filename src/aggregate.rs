//! Aggregation core behind `/api/startups`.
//!
//! Flow: cache lookup by composite key → on miss, dispatch to one fetcher or
//! fan out to several → dedup by id → cache → query-time filters → limit.
//! Filters run identically on cached and fresh data.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::counter;

use crate::batch;
use crate::cache::RecordCache;
use crate::config::AppConfig;
use crate::envelope::{format_last_updated, iso_timestamp, EchoedFilters, Stats, StartupsResponse};
use crate::ingest::http::HttpClient;
use crate::ingest::providers::{
    curated::CuratedFetcher, directory::DirectoryFetcher, hackernews::HackerNewsFetcher,
    trending::TrendingFetcher,
};
use crate::ingest::types::{FetchParams, SourceFetcher};
use crate::ingest::{dedup_by_id, ensure_metrics_described, fetch_soft};
use crate::record::Record;

pub const DEFAULT_SOURCE: &str = "github_trending";
pub const DEFAULT_LIMIT: usize = 50;
pub const FAILURE_MESSAGE: &str = "Failed to fetch startups";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    YcOss,
    YcAll,
    YcVerified,
    Hackernews,
    GithubTrending,
    All,
    /// Anything else: served by trending with no language narrowing.
    Other(String),
}

impl SourceSelector {
    pub fn parse(s: &str) -> Self {
        match s {
            "yc_oss" => SourceSelector::YcOss,
            "yc_all" => SourceSelector::YcAll,
            "yc_verified" => SourceSelector::YcVerified,
            "hackernews" => SourceSelector::Hackernews,
            "github_trending" => SourceSelector::GithubTrending,
            "all" => SourceSelector::All,
            other => SourceSelector::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceSelector::YcOss => "yc_oss",
            SourceSelector::YcAll => "yc_all",
            SourceSelector::YcVerified => "yc_verified",
            SourceSelector::Hackernews => "hackernews",
            SourceSelector::GithubTrending => "github_trending",
            SourceSelector::All => "all",
            SourceSelector::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupQuery {
    pub source: String,
    pub new_only: bool,
    pub limit: usize,
    /// Empty means no language filter.
    pub language: String,
    /// Empty means no search filter.
    pub search: String,
}

impl Default for StartupQuery {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            new_only: false,
            limit: DEFAULT_LIMIT,
            language: String::new(),
            search: String::new(),
        }
    }
}

impl StartupQuery {
    fn language(&self) -> Option<&str> {
        Some(self.language.trim()).filter(|l| !l.is_empty())
    }

    fn echoed(&self) -> EchoedFilters {
        EchoedFilters {
            new_only: self.new_only,
            limit: self.limit,
            language: self.language().unwrap_or_default().to_string(),
            q: self.search.clone(),
        }
    }
}

/// The fetchers the aggregator can dispatch to.
#[derive(Clone)]
pub struct SourceRegistry {
    pub directory_oss: Arc<dyn SourceFetcher>,
    pub directory_all: Arc<dyn SourceFetcher>,
    pub curated: Arc<dyn SourceFetcher>,
    pub news: Arc<dyn SourceFetcher>,
    pub trending: Arc<dyn SourceFetcher>,
}

impl SourceRegistry {
    pub fn from_config(cfg: &AppConfig, http: HttpClient) -> Self {
        Self {
            directory_oss: Arc::new(DirectoryFetcher::open_source(http.clone(), cfg)),
            directory_all: Arc::new(DirectoryFetcher::all(http.clone(), cfg)),
            curated: Arc::new(CuratedFetcher::new(http.clone(), cfg)),
            news: Arc::new(HackerNewsFetcher::new(http.clone(), cfg)),
            trending: Arc::new(TrendingFetcher::new(http, cfg)),
        }
    }
}

/// Per-source knobs used when building fetch params.
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub new_only_min_year: i32,
    pub directory_min_year: i32,
    pub directory_cap: usize,
    pub hackernews_limit: usize,
    pub hackernews_fanout_limit: usize,
    pub trending_limit: usize,
    pub trending_fanout_limit: usize,
    pub available_languages: Vec<String>,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl AggregatorSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            new_only_min_year: cfg.years.new_only_min_year,
            directory_min_year: cfg.years.directory_min_year,
            directory_cap: cfg.limits.directory_cap,
            hackernews_limit: cfg.limits.hackernews,
            hackernews_fanout_limit: cfg.limits.hackernews_fanout,
            trending_limit: cfg.limits.trending,
            trending_fanout_limit: cfg.limits.trending_fanout,
            available_languages: cfg.available_languages.clone(),
        }
    }
}

/// Which fetchers a query resolves to, and what they already filter.
struct Plan {
    branches: Vec<(Arc<dyn SourceFetcher>, FetchParams)>,
    language_at_source: bool,
    new_only_at_source: bool,
}

impl Plan {
    fn new(branches: Vec<(Arc<dyn SourceFetcher>, FetchParams)>) -> Self {
        let caps: Vec<_> = branches
            .iter()
            .map(|(f, p)| (f.capabilities(), p.language.is_some()))
            .collect();
        // A post-filter is redundant only when every branch already applied it.
        let language_at_source = caps.iter().all(|(c, sent)| c.language_at_source && *sent);
        let new_only_at_source = caps.iter().all(|(c, _)| c.new_only_at_source);
        Self {
            branches,
            language_at_source,
            new_only_at_source,
        }
    }
}

/// Query-time filters, in application order.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub min_year: Option<i32>,
    pub language: Option<String>,
    pub search: Option<String>,
    pub limit: usize,
}

/// New-only → language → search → limit. The limit bounds the filtered list.
pub fn apply_filters(records: &[Record], filters: &FilterSpec) -> Vec<Record> {
    let needle = filters
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    records
        .iter()
        .filter(|r| filters.min_year.map_or(true, |y| batch::is_new(r, y)))
        .filter(|r| filters.language.as_deref().map_or(true, |l| r.has_language(l)))
        .filter(|r| needle.as_deref().map_or(true, |n| r.matches_search(n)))
        .take(filters.limit)
        .cloned()
        .collect()
}

pub struct Aggregator {
    cache: Arc<RecordCache>,
    sources: SourceRegistry,
    settings: AggregatorSettings,
}

impl Aggregator {
    pub fn new(cache: Arc<RecordCache>, sources: SourceRegistry, settings: AggregatorSettings) -> Self {
        Self {
            cache,
            sources,
            settings,
        }
    }

    /// Production wiring with a fresh client.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self::with_http(cfg, HttpClient::from_config(cfg)?))
    }

    /// Production wiring: real fetchers sharing `http`.
    pub fn with_http(cfg: &AppConfig, http: HttpClient) -> Self {
        Self::new(
            Arc::new(RecordCache::new(cfg.cache_ttl())),
            SourceRegistry::from_config(cfg, http),
            AggregatorSettings::from_config(cfg),
        )
    }

    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    pub fn available_languages(&self) -> &[String] {
        &self.settings.available_languages
    }

    fn plan(&self, selector: &SourceSelector, q: &StartupQuery) -> Plan {
        let s = &self.settings;
        let lang = q.language().map(str::to_string);
        let with_limit = |limit: usize, language: Option<String>| FetchParams {
            language,
            limit: Some(limit),
            min_year: None,
        };

        let branches: Vec<(Arc<dyn SourceFetcher>, FetchParams)> = match selector {
            SourceSelector::YcOss => vec![(self.sources.directory_oss.clone(), FetchParams::default())],
            SourceSelector::YcAll => {
                let min_year = if q.new_only {
                    s.new_only_min_year
                } else {
                    s.directory_min_year
                };
                vec![(
                    self.sources.directory_all.clone(),
                    FetchParams {
                        language: None,
                        limit: Some(s.directory_cap),
                        min_year: Some(min_year),
                    },
                )]
            }
            SourceSelector::YcVerified => vec![(self.sources.curated.clone(), FetchParams::default())],
            SourceSelector::Hackernews => {
                vec![(self.sources.news.clone(), with_limit(s.hackernews_limit, None))]
            }
            SourceSelector::GithubTrending => {
                vec![(self.sources.trending.clone(), with_limit(s.trending_limit, lang))]
            }
            SourceSelector::All => vec![
                (self.sources.directory_oss.clone(), FetchParams::default()),
                (self.sources.news.clone(), with_limit(s.hackernews_fanout_limit, None)),
                (self.sources.trending.clone(), with_limit(s.trending_fanout_limit, lang)),
            ],
            SourceSelector::Other(_) => {
                vec![(self.sources.trending.clone(), with_limit(s.trending_limit, None))]
            }
        };
        Plan::new(branches)
    }

    /// `{source}:{language|all}`, plus `:new` when the payload itself depends
    /// on the new-only flag.
    fn cache_key(&self, q: &StartupQuery, plan: &Plan) -> String {
        let mut key = format!("{}:{}", q.source, q.language().unwrap_or("all"));
        if plan.new_only_at_source && q.new_only {
            key.push_str(":new");
        }
        key
    }

    /// Serve one query. Errors here are unexpected (fetch failures are
    /// already absorbed per branch); callers turn them into `degraded`.
    pub async fn query(&self, q: &StartupQuery) -> Result<StartupsResponse> {
        ensure_metrics_described();
        let selector = SourceSelector::parse(&q.source);
        let plan = self.plan(&selector, q);
        let key = self.cache_key(q, &plan);

        let (entry, cached) = match self.cache.get(&key) {
            Some(entry) => {
                counter!("startups_cache_hits_total").increment(1);
                tracing::info!(target: "aggregate", %key, "cache hit");
                (entry, true)
            }
            None => {
                counter!("startups_cache_misses_total").increment(1);
                tracing::info!(target: "aggregate", %key, "cache miss, fetching");
                let records = dispatch(&plan).await?;
                let (records, dropped) = dedup_by_id(records);
                if dropped > 0 {
                    tracing::debug!(target: "aggregate", %key, dropped, "duplicate ids removed");
                }
                (self.cache.set(&key, records, selector.as_str()), false)
            }
        };

        let filter_spec = FilterSpec {
            min_year: (q.new_only && !plan.new_only_at_source).then_some(self.settings.new_only_min_year),
            language: if plan.language_at_source {
                None
            } else {
                q.language().map(str::to_string)
            },
            search: Some(q.search.clone()),
            limit: q.limit,
        };
        let startups = apply_filters(&entry.records, &filter_spec);

        Ok(StartupsResponse {
            error: None,
            count: startups.len(),
            total_cached: entry.records.len(),
            stats: Stats::from_records(&startups),
            startups,
            source: q.source.clone(),
            filters: q.echoed(),
            last_updated: iso_timestamp(entry.created_at),
            last_updated_formatted: format_last_updated(entry.created_at, Utc::now()),
            available_languages: self.settings.available_languages.clone(),
            cached,
        })
    }

    /// Envelope for an unexpected failure: no records, fresh timestamp.
    pub fn degraded(&self, q: &StartupQuery) -> StartupsResponse {
        let now = Utc::now();
        StartupsResponse {
            error: Some(FAILURE_MESSAGE.to_string()),
            startups: Vec::new(),
            count: 0,
            total_cached: 0,
            source: q.source.clone(),
            filters: q.echoed(),
            last_updated: iso_timestamp(now),
            last_updated_formatted: format_last_updated(now, now),
            available_languages: self.settings.available_languages.clone(),
            cached: false,
            stats: Stats::default(),
        }
    }
}

/// Start every branch concurrently, then collect in plan order.
async fn dispatch(plan: &Plan) -> Result<Vec<Record>> {
    let handles: Vec<_> = plan
        .branches
        .iter()
        .map(|(fetcher, params)| {
            let fetcher = fetcher.clone();
            let params = params.clone();
            tokio::spawn(async move { fetch_soft(fetcher.as_ref(), &params).await })
        })
        .collect();

    let mut out = Vec::new();
    for (handle, (fetcher, _)) in handles.into_iter().zip(&plan.branches) {
        let outcome = handle
            .await
            .with_context(|| format!("source task {} aborted", fetcher.name()))?;
        if let Some(reason) = &outcome.diagnostic {
            tracing::warn!(target: "aggregate", source = fetcher.name(), %reason, "branch returned nothing");
        }
        out.extend(outcome.records);
    }
    Ok(out)
}
