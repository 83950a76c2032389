//! # Time-windowed source cache
//! Keeps the last *successful* result per source key together with its fetch
//! time. Errors never enter the cache, so a failing source is retried on every
//! call while an older good value stays stored.
//!
//! The map lock is held only for lookups and stores, never across the fetch;
//! two concurrent misses for the same key may both fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::sources::types::SourceResult;

/// Source of "now" for the cache and the market-time logic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        *self.now.lock().expect("manual clock poisoned") = t;
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(by) = chrono::Duration::from_std(by) {
            *self.now.lock().expect("manual clock poisoned") += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("manual clock poisoned")
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: SourceResult,
    pub fetched_at: DateTime<Utc>,
}

pub struct TimedCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl TimedCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Stored value for `key` if it is younger than `window`.
    pub fn lookup(&self, key: &str, window: Duration) -> Option<SourceResult> {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("source cache poisoned");
        let entry = entries.get(key)?;
        // A fetch time in the future (clock stepped back) counts as stale.
        let age = (now - entry.fetched_at).to_std().ok()?;
        (age < window).then(|| entry.value.clone())
    }

    /// Last stored entry regardless of age.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .lock()
            .expect("source cache poisoned")
            .get(key)
            .cloned()
    }

    /// Serve `key` from the cache when fresh, otherwise run `fetch` and store
    /// its result if (and only if) it succeeded.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, window: Duration, fetch: F) -> SourceResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SourceResult>,
    {
        if let Some(hit) = self.lookup(key, window) {
            counter!("source_cache_hits_total", "source" => key.to_string()).increment(1);
            tracing::debug!(source = key, "cache hit");
            return hit;
        }
        counter!("source_cache_misses_total", "source" => key.to_string()).increment(1);

        let fresh = fetch().await;
        if fresh.is_ok() {
            let entry = CacheEntry {
                value: fresh.clone(),
                fetched_at: self.clock.now(),
            };
            self.entries
                .lock()
                .expect("source cache poisoned")
                .insert(key.to_string(), entry);
            counter!("source_cache_stores_total", "source" => key.to_string()).increment(1);
            tracing::debug!(source = key, "cache stored");
        }
        fresh
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("source cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
