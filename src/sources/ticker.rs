// src/sources/ticker.rs
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::derived::percent::format_signed_percent;
use crate::sources::types::{FetchContext, FetchError, SourceAdapter};
use crate::sources::{get_json, json_f64};

/// 24h change computed from a ticker endpoint exposing `openPrice` and `lastPrice`
/// (Binance `/api/v3/ticker/24hr` shape).
pub struct TickerAdapter {
    client: reqwest::Client,
    url: String,
}

impl TickerAdapter {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for TickerAdapter {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<String, FetchError> {
        let json = get_json(&self.client, &self.url, HeaderMap::new()).await?;
        parse_ticker(&json)
    }

    fn name(&self) -> &'static str {
        "ticker"
    }
}

pub fn parse_ticker(json: &Value) -> Result<String, FetchError> {
    let field = |name: &str| {
        json.get(name)
            .and_then(json_f64)
            .ok_or_else(|| FetchError::Missing(format!("Campo '{name}' no encontrado en ticker")))
    };
    let open = field("openPrice")?;
    let last = field("lastPrice")?;
    if open <= 0.0 {
        return Err(FetchError::Parse(format!("precio de apertura inválido: {open}")));
    }
    Ok(format_signed_percent((last / open - 1.0) * 100.0))
}
