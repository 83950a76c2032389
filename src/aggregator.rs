// src/aggregator.rs
//! Ties the catalog, adapters, cache, clock and quote book together and
//! produces one `AggregatedSnapshot` per request.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;

use crate::cache::{Clock, TimedCache};
use crate::config::Catalog;
use crate::market::to_local;
use crate::orchestrator::{fetch_all, FetchOptions, Source};
use crate::snapshot::{assemble, AggregatedSnapshot};
use crate::sources::quotes::{HtmlQuoteProvider, QuoteBook, QuoteProvider};
use crate::sources::types::{FetchContext, SourceAdapter};
use crate::sources::{browser_client, build_adapter};

pub struct Aggregator {
    catalog: Catalog,
    tz: Tz,
    sources: Vec<Source>,
    cache: Arc<TimedCache>,
    clock: Arc<dyn Clock>,
    quotes: QuoteBook,
    options: FetchOptions,
}

impl Aggregator {
    /// Build adapters for every configured source. Fails on invalid
    /// selectors, timezones or client setup.
    pub fn from_catalog(catalog: Catalog, clock: Arc<dyn Clock>) -> Result<Self> {
        let settings = &catalog.settings;
        let tz = settings.tz()?;

        let mut sources = Vec::with_capacity(catalog.instruments.len() + catalog.page_data.len());
        for spec in &catalog.instruments {
            sources.push(Source {
                key: spec.key.clone(),
                cacheable: spec.cacheable,
                adapter: build_adapter(&spec.source, settings)
                    .with_context(|| format!("building adapter for instrument '{}'", spec.key))?,
            });
        }
        for spec in &catalog.page_data {
            sources.push(Source {
                key: spec.key.clone(),
                cacheable: spec.cacheable,
                adapter: build_adapter(&spec.source, settings)
                    .with_context(|| format!("building adapter for page data '{}'", spec.key))?,
            });
        }

        let quote_provider: Option<Arc<dyn QuoteProvider>> = match &catalog.quotes.url {
            Some(url) => Some(Arc::new(HtmlQuoteProvider::new(
                browser_client(&settings.user_agent, settings.fetch_timeout())?,
                url,
                &catalog.quotes.selector,
            )?)),
            None => None,
        };

        let options = FetchOptions {
            timeout: settings.fetch_timeout(),
            cache_window: settings.cache_window(),
        };
        tracing::info!(
            sources = sources.len(),
            cache_window_secs = settings.cache_window_secs,
            timeout_secs = settings.fetch_timeout_secs,
            timezone = %tz,
            "aggregator ready"
        );

        Ok(Self {
            quotes: QuoteBook::new(quote_provider, options.timeout),
            cache: Arc::new(TimedCache::new(Arc::clone(&clock))),
            catalog,
            tz,
            sources,
            clock,
            options,
        })
    }

    /// Swap the adapter of an already-configured key.
    pub fn with_adapter(mut self, key: &str, adapter: Arc<dyn SourceAdapter>) -> Result<Self> {
        match self.sources.iter_mut().find(|s| s.key == key) {
            Some(source) => source.adapter = adapter,
            None => bail!("no configured source named '{key}'"),
        }
        Ok(self)
    }

    pub fn with_quote_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.quotes.set_provider(provider);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<TimedCache> {
        &self.cache
    }

    /// Fetch everything (quotes included) concurrently and assemble the response.
    pub async fn snapshot(&self) -> Result<AggregatedSnapshot> {
        let now_utc = self.clock.now();
        let local = to_local(now_utc, self.tz);
        let ctx = FetchContext { now: local };

        let (results, quote) = tokio::join!(
            fetch_all(&self.sources, &self.cache, &ctx, self.options),
            self.quotes.random_quote()
        );

        let failed = results.values().filter(|r| !r.is_ok()).count();
        tracing::info!(sources = results.len(), failed, "sources fetched");

        assemble(&self.catalog, &results, now_utc, local, quote)
    }
}
