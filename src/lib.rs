// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod batch;
pub mod cache;
pub mod config;
pub mod envelope;
pub mod ingest;
pub mod issues;
pub mod metrics;
pub mod record;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{Aggregator, StartupQuery};
pub use crate::api::router;
pub use crate::record::{Record, Source};
