// src/sources/mod.rs
//! Source adapters: one upstream page or API per configured key.
//!
//! Every adapter does a single GET and turns the body into a display string.
//! Transport variants: HTML selector extraction, Morningstar JSON fields,
//! ticker computation and price-history CAGR.

pub mod history;
pub mod html;
pub mod morningstar;
pub mod quotes;
pub mod ticker;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;

use crate::config::{Settings, SourceSpec};
use crate::sources::types::{FetchError, FixedAdapter, SourceAdapter};

/// Build the adapter for one configured source.
pub fn build_adapter(spec: &SourceSpec, settings: &Settings) -> Result<Arc<dyn SourceAdapter>> {
    let timeout = settings.fetch_timeout();
    let adapter: Arc<dyn SourceAdapter> = match spec {
        SourceSpec::HtmlSelector {
            url,
            selector,
            ensure_percent,
        } => Arc::new(html::HtmlSelectorAdapter::new(
            browser_client(&settings.user_agent, timeout)?,
            url,
            selector,
            *ensure_percent,
        )?),
        SourceSpec::MorningstarYtd { fund_id } => Arc::new(morningstar::MorningstarAdapter::new(
            browser_client(&settings.user_agent, timeout)?,
            morningstar::Endpoint::YearToDate,
            fund_id,
            settings.morningstar_api_key(),
        )),
        SourceSpec::MorningstarTrailing { fund_id } => {
            Arc::new(morningstar::MorningstarAdapter::new(
                browser_client(&settings.user_agent, timeout)?,
                morningstar::Endpoint::TrailingReturn,
                fund_id,
                settings.morningstar_api_key(),
            ))
        }
        SourceSpec::Ticker { url } => Arc::new(ticker::TickerAdapter::new(
            browser_client(&settings.user_agent, timeout)?,
            url,
        )),
        SourceSpec::PriceHistory { url } => Arc::new(history::PriceHistoryAdapter::new(
            browser_client(&settings.user_agent, timeout)?,
            url,
        )),
        SourceSpec::Fixed { value, error } => match (value, error) {
            (Some(v), _) => Arc::new(FixedAdapter::value(v.clone())),
            (None, Some(e)) => Arc::new(FixedAdapter::error(e.clone())),
            (None, None) => anyhow::bail!("fixed source needs either `value` or `error`"),
        },
    };
    Ok(adapter)
}

/// HTTP client shared by all requests of one adapter.
pub(crate) fn browser_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(4).min(timeout))
        .timeout(timeout)
        .build()
        .context("building reqwest client")
}

/// GET `url` and return the body, treating non-2xx as an error.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
) -> Result<String, FetchError> {
    tracing::info!(%url, "fetching source");
    let resp = client.get(url).headers(headers).send().await?;
    let resp = resp.error_for_status()?;
    Ok(resp.text().await?)
}

/// GET `url` and decode the body as JSON.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
) -> Result<serde_json::Value, FetchError> {
    let body = get_text(client, url, headers).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Read a JSON number that upstreams sometimes send as a string.
pub(crate) fn json_f64(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}
