//! Batch-year policy shared by fetchers and the new-only filter.
//!
//! Batch labels are free form across sources ("W24", "Winter 2025",
//! "2025-01-01"). A 4-digit `20dd` year wins; otherwise a season letter plus
//! two digits maps to `2000 + dd`. Two-digit years never roll over, so "S99"
//! is 2099.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::Record;

/// Default threshold for `newOnly=true`.
pub const NEW_ONLY_MIN_YEAR: i32 = 2025;

static RE_FULL_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"20\d{2}").expect("year regex"));
static RE_SEASON_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[WSF](\d{2})").expect("season regex"));

/// Extract a year from a batch label, if any.
pub fn extract_year(batch: &str) -> Option<i32> {
    if batch.is_empty() {
        return None;
    }
    if let Some(m) = RE_FULL_YEAR.find(batch) {
        return m.as_str().parse().ok();
    }
    RE_SEASON_YEAR
        .captures(batch)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .map(|yy| 2000 + yy)
}

/// True when the record's batch year is known and at least `min_year`.
pub fn is_new(record: &Record, min_year: i32) -> bool {
    extract_year(&record.batch).is_some_and(|y| y >= min_year)
}

/// Keep only records whose batch year is at least `min_year`.
pub fn filter_new(records: Vec<Record>, min_year: i32) -> Vec<Record> {
    records.into_iter().filter(|r| is_new(r, min_year)).collect()
}
