// src/sources/quotes.rs
//! Investor quote of the day. The scraped list is memoized for the process
//! lifetime once a fetch returns at least one quote.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::HeaderMap;
use scraper::Selector;

use crate::sources::get_text;
use crate::sources::html::{all_texts, parse_selector};
use crate::sources::types::FetchError;

/// Served when the quotes page loads but has no quotes on it.
pub const EMPTY_PAGE_QUOTE: &str = "No invierta, simplemente, posea acciones.";
/// Served when the quotes page cannot be fetched.
pub const FAILED_FETCH_QUOTE: &str = "El error más grande es no permanecer en el camino.";

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quotes(&self) -> Result<Vec<String>, FetchError>;
}

pub struct HtmlQuoteProvider {
    client: reqwest::Client,
    url: String,
    selector: Selector,
}

impl HtmlQuoteProvider {
    pub fn new(client: reqwest::Client, url: &str, selector: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            url: url.to_string(),
            selector: parse_selector(selector)?,
        })
    }
}

#[async_trait]
impl QuoteProvider for HtmlQuoteProvider {
    async fn fetch_quotes(&self) -> Result<Vec<String>, FetchError> {
        let body = get_text(&self.client, &self.url, HeaderMap::new()).await?;
        Ok(all_texts(&body, &self.selector, " "))
    }
}

pub struct QuoteBook {
    provider: Option<Arc<dyn QuoteProvider>>,
    timeout: Duration,
    memo: RwLock<Vec<String>>,
}

impl QuoteBook {
    pub fn new(provider: Option<Arc<dyn QuoteProvider>>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            memo: RwLock::new(Vec::new()),
        }
    }

    pub fn set_provider(&mut self, provider: Arc<dyn QuoteProvider>) {
        self.provider = Some(provider);
        self.memo.write().expect("quote memo poisoned").clear();
    }

    pub async fn random_quote(&self) -> String {
        if let Some(q) = self.pick() {
            return q;
        }
        let Some(provider) = &self.provider else {
            return EMPTY_PAGE_QUOTE.to_string();
        };

        let fetched = match tokio::time::timeout(self.timeout, provider.fetch_quotes()).await {
            Ok(r) => r,
            Err(_) => Err(FetchError::Timeout(self.timeout.as_secs())),
        };
        match fetched {
            Ok(quotes) if !quotes.is_empty() => {
                tracing::info!(count = quotes.len(), "quotes memoized");
                *self.memo.write().expect("quote memo poisoned") = quotes;
                self.pick().unwrap_or_else(|| EMPTY_PAGE_QUOTE.to_string())
            }
            Ok(_) => EMPTY_PAGE_QUOTE.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "quotes fetch failed");
                FAILED_FETCH_QUOTE.to_string()
            }
        }
    }

    fn pick(&self) -> Option<String> {
        let quotes = self.memo.read().expect("quote memo poisoned");
        quotes.choose(&mut rand::rng()).cloned()
    }
}
