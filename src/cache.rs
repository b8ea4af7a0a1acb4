//! In-process record cache with an absolute TTL.
//!
//! Stale entries are never evicted; a read simply ignores them and the next
//! miss overwrites them. There is no single-flight: two requests racing on a
//! cold key both fetch, and the later `set` wins.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::record::Record;

/// Default TTL: 10 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub records: Vec<Record>,
    /// Wall-clock creation time, reported as `lastUpdated`.
    pub created_at: DateTime<Utc>,
    /// Selector that produced the payload.
    pub source: String,
    inserted: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted.elapsed() < ttl
    }
}

#[derive(Debug)]
pub struct RecordCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl RecordCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key`, or `None` if absent or stale.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let map = self.lock();
        map.get(key).filter(|e| e.is_fresh(self.ttl)).cloned()
    }

    /// Overwrite `key` unconditionally, stamping the current time.
    pub fn set(&self, key: &str, records: Vec<Record>, source: &str) -> CacheEntry {
        let entry = CacheEntry {
            records,
            created_at: Utc::now(),
            source: source.to_string(),
            inserted: Instant::now(),
        };
        self.lock().insert(key.to_string(), entry.clone());
        entry
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave the map half-written.
        match self.entries.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }
}
