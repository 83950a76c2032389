//! # Fetch orchestrator
//! Fans out one task per source, waits for all of them, and returns one
//! `SourceResult` per key. A slow source costs at most its own timeout; a
//! failing or panicking one only affects its own key.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::cache::TimedCache;
use crate::sources::types::{FetchContext, FetchError, SourceAdapter, SourceResult};

/// One configured source ready to be fetched.
#[derive(Clone)]
pub struct Source {
    pub key: String,
    pub cacheable: bool,
    pub adapter: Arc<dyn SourceAdapter>,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub cache_window: Duration,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("source_fetch_total", "Source fetches by outcome (ok/error).");
        describe_counter!("source_cache_hits_total", "Cacheable sources served from cache.");
        describe_counter!("source_cache_misses_total", "Cacheable sources that had to be fetched.");
        describe_counter!("source_cache_stores_total", "Successful fetches written to the cache.");
        describe_histogram!("source_fetch_ms", "Source fetch latency in milliseconds.");
    });
}

/// Fetch every source concurrently. Returns only after all tasks finished.
pub async fn fetch_all(
    sources: &[Source],
    cache: &Arc<TimedCache>,
    ctx: &FetchContext,
    opts: FetchOptions,
) -> BTreeMap<String, SourceResult> {
    ensure_metrics_described();

    let handles: Vec<(String, JoinHandle<SourceResult>)> = sources
        .iter()
        .map(|source| {
            let key = source.key.clone();
            let source = source.clone();
            let cache = Arc::clone(cache);
            let ctx = ctx.clone();
            let handle = tokio::spawn(async move {
                let fetch = || fetch_one(&source.key, source.adapter.as_ref(), &ctx, opts.timeout);
                if source.cacheable {
                    cache.get_or_fetch(&source.key, opts.cache_window, fetch).await
                } else {
                    fetch().await
                }
            });
            (key, handle)
        })
        .collect();

    let mut out = BTreeMap::new();
    for (key, handle) in handles {
        let result = match handle.await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(source = %key, error = %e, "fetch task died");
                counter!("source_fetch_total", "source" => key.clone(), "outcome" => "error")
                    .increment(1);
                SourceResult::from(FetchError::Panicked)
            }
        };
        out.insert(key, result);
    }
    out
}

/// One adapter call bounded by `timeout`.
async fn fetch_one(
    key: &str,
    adapter: &dyn SourceAdapter,
    ctx: &FetchContext,
    timeout: Duration,
) -> SourceResult {
    let t0 = Instant::now();
    let outcome = match tokio::time::timeout(timeout, adapter.fetch(ctx)).await {
        Ok(r) => r,
        Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
    };
    histogram!("source_fetch_ms", "source" => key.to_string())
        .record(t0.elapsed().as_secs_f64() * 1_000.0);

    match &outcome {
        Ok(_) => {
            counter!("source_fetch_total", "source" => key.to_string(), "outcome" => "ok")
                .increment(1);
        }
        Err(e) => {
            tracing::warn!(
                source = key,
                adapter = adapter.name(),
                kind = e.kind(),
                error = %e,
                "source fetch failed"
            );
            counter!("source_fetch_total", "source" => key.to_string(), "outcome" => "error")
                .increment(1);
        }
    }
    SourceResult::from(outcome)
}
