// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod derived;
pub mod market;
pub mod metrics;
pub mod orchestrator;
pub mod snapshot;
pub mod sources;

use std::sync::Arc;

use axum::Router;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::Aggregator;
pub use crate::api::{router, AppState};
pub use crate::cache::{Clock, ManualClock, SystemClock, TimedCache};
pub use crate::config::Catalog;
pub use crate::sources::types::{FetchContext, FetchError, SourceAdapter, SourceResult};

/// Full application router: catalog from env/disk, real adapters, system clock,
/// plus `/metrics`.
pub fn app() -> anyhow::Result<Router> {
    let catalog = Catalog::load_default()?;
    let metrics = crate::metrics::Metrics::init(catalog.settings.cache_window_secs);
    let aggregator = Aggregator::from_catalog(catalog, Arc::new(SystemClock))?;
    Ok(api::router(AppState::new(aggregator)).merge(metrics.router()))
}
