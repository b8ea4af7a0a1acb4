// src/ingest/mod.rs
pub mod http;
pub mod providers;
pub mod types;

use crate::ingest::types::{FetchOutcome, FetchParams, SourceFetcher};
use crate::record::Record;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::HashSet;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "source_records_total",
            "Records returned by source fetchers."
        );
        describe_counter!(
            "source_fetch_errors_total",
            "Source fetches that failed and yielded no records."
        );
        describe_histogram!("source_fetch_ms", "Source fetch time in milliseconds.");
        describe_counter!("startups_cache_hits_total", "Aggregation cache hits.");
        describe_counter!("startups_cache_misses_total", "Aggregation cache misses.");
    });
}

/// Decode HTML entities, strip tags and collapse whitespace.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, "");
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// Run a fetcher without letting it fail: errors become an empty outcome
/// with a diagnostic, logged and counted.
pub async fn fetch_soft(fetcher: &dyn SourceFetcher, params: &FetchParams) -> FetchOutcome {
    ensure_metrics_described();
    let name = fetcher.name();
    let t0 = std::time::Instant::now();

    let outcome = match fetcher.fetch(params).await {
        Ok(records) => {
            counter!("source_records_total", "source" => name).increment(records.len() as u64);
            tracing::debug!(target: "ingest", source = name, count = records.len(), "fetched");
            FetchOutcome::ok(records)
        }
        Err(e) => {
            tracing::warn!(target: "ingest", error = ?e, source = name, "source fetch failed");
            counter!("source_fetch_errors_total", "source" => name).increment(1);
            FetchOutcome::failed(format!("{name}: {e:#}"))
        }
    };

    histogram!("source_fetch_ms", "source" => name).record(t0.elapsed().as_secs_f64() * 1_000.0);
    outcome
}

/// Drop records whose id was already seen; first occurrence wins.
pub fn dedup_by_id(records: Vec<Record>) -> (Vec<Record>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut keep = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for r in records {
        if seen.insert(r.id.clone()) {
            keep.push(r);
        } else {
            dropped += 1;
        }
    }
    (keep, dropped)
}
