// src/config/mod.rs
//! Service configuration: TOML file with serde defaults, then env overrides.
//!
//! Lookup order:
//! 1) $GITGROW_CONFIG_PATH (must exist)
//! 2) config/gitgrow.toml
//! 3) built-in defaults
//!
//! Env overrides applied last: GITHUB_TOKEN, CACHE_TTL_SECS, METRICS_ENABLED.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "GITGROW_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/gitgrow.toml";

const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
const ENV_CACHE_TTL_SECS: &str = "CACHE_TTL_SECS";
const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

/// Upper bound for the trending creation window.
pub const MAX_TRENDING_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Record cache TTL.
    pub cache_ttl_secs: u64,
    /// `s-maxage` sent to intermediaries; stale-while-revalidate is twice this.
    pub http_cache_max_age_secs: u64,
    /// Identifying client header required by GitHub.
    pub user_agent: String,
    /// Optional bearer token for GitHub (raises rate limits).
    pub github_token: Option<String>,
    /// Outbound request timeout. `None` leaves reqwest's default (no timeout).
    pub http_timeout_secs: Option<u64>,
    pub metrics_enabled: bool,
    pub upstream: UpstreamConfig,
    pub limits: LimitsConfig,
    pub trending: TrendingConfig,
    pub years: YearsConfig,
    /// Language facets offered to the filter UI.
    pub available_languages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// YC directory API; `open-source.json` and `all.json` live below it.
    pub directory_base: String,
    /// Markdown list used when the open-source JSON is unavailable.
    pub readme_fallback_url: String,
    pub github_api_base: String,
    pub hn_api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub hackernews: usize,
    pub hackernews_fanout: usize,
    /// Upper bound on Show HN ids examined per fetch.
    pub hackernews_window: usize,
    pub trending: usize,
    pub trending_fanout: usize,
    /// Cap for the full YC directory.
    pub directory_cap: usize,
    /// Repositories requested per curated org.
    pub curated_per_org: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    pub window_days: i64,
    pub min_stars: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YearsConfig {
    /// Floor applied to the full YC directory when new-only is off.
    pub directory_min_year: i32,
    pub new_only_min_year: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 10 * 60,
            http_cache_max_age_secs: 10 * 60,
            user_agent: "GitGrow".to_string(),
            github_token: None,
            http_timeout_secs: None,
            metrics_enabled: false,
            upstream: UpstreamConfig::default(),
            limits: LimitsConfig::default(),
            trending: TrendingConfig::default(),
            years: YearsConfig::default(),
            available_languages: [
                "JavaScript",
                "TypeScript",
                "Python",
                "Go",
                "Rust",
                "Java",
                "C++",
                "Ruby",
                "PHP",
                "Swift",
                "Kotlin",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            directory_base: "https://yc-oss.github.io/api/companies".to_string(),
            readme_fallback_url:
                "https://raw.githubusercontent.com/yc-oss/open-source-companies/main/README.md"
                    .to_string(),
            github_api_base: "https://api.github.com".to_string(),
            hn_api_base: "https://hacker-news.firebaseio.com/v0".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            hackernews: 100,
            hackernews_fanout: 30,
            hackernews_window: 100,
            trending: 100,
            trending_fanout: 50,
            directory_cap: 500,
            curated_per_org: 3,
        }
    }
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_stars: 50,
        }
    }
}

impl Default for YearsConfig {
    fn default() -> Self {
        Self {
            directory_min_year: 2020,
            new_only_min_year: crate::batch::NEW_ONLY_MIN_YEAR,
        }
    }
}

impl AppConfig {
    /// Parse an explicit TOML file. Missing keys fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolve the config file via env + fallbacks, then apply env overrides.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                Self::default()
            }
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(token) = std::env::var(ENV_GITHUB_TOKEN)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
        {
            self.github_token = Some(token);
        }
        if let Some(ttl) = std::env::var(ENV_CACHE_TTL_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.cache_ttl_secs = ttl;
        }
        if let Ok(v) = std::env::var(ENV_METRICS_ENABLED) {
            self.metrics_enabled = matches!(v.trim(), "1" | "true" | "TRUE");
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        if self.user_agent.trim().is_empty() {
            self.user_agent = AppConfig::default().user_agent;
        }
        // GitHub caps per_page at 100.
        self.limits.trending = self.limits.trending.clamp(1, 100);
        self.limits.trending_fanout = self.limits.trending_fanout.clamp(1, 100);
        self.limits.curated_per_org = self.limits.curated_per_org.clamp(1, 100);
        self.trending.window_days = self.trending.window_days.clamp(1, MAX_TRENDING_WINDOW_DAYS);
        self.available_languages.retain(|l| !l.trim().is_empty());
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// `Cache-Control` value for successful responses.
    pub fn cache_control(&self) -> String {
        let max_age = self.http_cache_max_age_secs;
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            max_age,
            max_age.saturating_mul(2)
        )
    }
}
