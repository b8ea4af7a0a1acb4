//! Prometheus exposition, enabled with `METRICS_ENABLED=1`.
//!
//! Series recorded elsewhere:
//! - `startups_cache_hits_total` / `startups_cache_misses_total` (aggregate)
//! - `source_records_total{source}` / `source_fetch_errors_total{source}` (ingest)
//! - `source_fetch_ms{source}` histogram (ingest)

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Upstream latency buckets in ms; GitHub search and HN fan-out sit in the 100ms–10s range.
const FETCH_MS_BUCKETS: &[f64] = &[
    50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 30_000.0,
];

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the cache TTL as a static gauge.
    /// Only one recorder can exist per process.
    pub fn init(ttl_secs: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full("source_fetch_ms".to_string()), FETCH_MS_BUCKETS)
            .context("prometheus: fetch latency buckets")?
            .install_recorder()
            .context("prometheus: install recorder")?;

        gauge!("startups_cache_ttl_seconds").set(ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
