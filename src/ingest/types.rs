// src/ingest/types.rs
use anyhow::Result;

use crate::record::Record;

/// Per-call knobs passed to a fetcher. Fetchers ignore what they don't use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    /// Language the upstream should narrow to, if it can.
    pub language: Option<String>,
    pub limit: Option<usize>,
    /// Drop records whose batch year is below this (or unknown).
    pub min_year: Option<i32>,
}

/// What a fetcher does on its own, so the aggregator can skip redundant
/// post-filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub language_at_source: bool,
    pub new_only_at_source: bool,
}

/// Result of a soft fetch: records (possibly empty) plus why it came back
/// empty, when it failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub records: Vec<Record>,
    pub diagnostic: Option<String>,
}

impl FetchOutcome {
    pub fn ok(records: Vec<Record>) -> Self {
        Self {
            records,
            diagnostic: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            diagnostic: Some(reason.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.diagnostic.is_some()
    }
}

#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, params: &FetchParams) -> Result<Vec<Record>>;
    fn name(&self) -> &'static str;
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}
