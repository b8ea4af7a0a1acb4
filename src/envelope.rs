//! Response envelope for `/api/startups`, plus the stats and freshness
//! helpers that feed it.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub startups: Vec<Record>,
    pub count: usize,
    /// Records held for the cache key before query-time filters.
    pub total_cached: usize,
    pub source: String,
    pub filters: EchoedFilters,
    pub last_updated: String,
    pub last_updated_formatted: String,
    pub available_languages: Vec<String>,
    pub cached: bool,
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoedFilters {
    pub new_only: bool,
    pub limit: usize,
    pub language: String,
    pub q: String,
}

/// Figures for the stats bar, over the returned page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub count: usize,
    pub total_stars: u64,
    /// Distinct language names.
    pub languages: usize,
}

impl Stats {
    pub fn from_records(records: &[Record]) -> Self {
        let langs: HashSet<&str> = records
            .iter()
            .flat_map(|r| r.languages.iter().map(String::as_str))
            .collect();
        Self {
            count: records.len(),
            total_stars: records.iter().map(|r| r.stars).sum(),
            languages: langs.len(),
        }
    }
}

/// ISO-8601 with millisecond precision, e.g. `2025-01-01T10:00:00.000Z`.
pub fn iso_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Relative label for the "data updated" line.
pub fn format_last_updated(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - then).num_minutes();
    if mins < 1 {
        return "just now".to_string();
    }
    if mins < 60 {
        return format!("{mins} min ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        let plural = if hours > 1 { "s" } else { "" };
        return format!("{hours} hour{plural} ago");
    }
    then.format("%b %-d, %Y").to_string()
}
