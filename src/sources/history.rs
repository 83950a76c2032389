// src/sources/history.rs
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::derived::cagr::{compound_annual_growth_rate, PricePoint};
use crate::derived::percent::format_signed_percent;
use crate::sources::types::{FetchContext, FetchError, SourceAdapter};
use crate::sources::{get_json, json_f64};

/// Annualized growth over a chart API's full history
/// (Yahoo `v8/finance/chart` shape).
pub struct PriceHistoryAdapter {
    client: reqwest::Client,
    url: String,
}

impl PriceHistoryAdapter {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for PriceHistoryAdapter {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<String, FetchError> {
        let json = get_json(&self.client, &self.url, HeaderMap::new()).await?;
        let points = parse_chart(&json)?;
        compound_annual_growth_rate(&points)
            .map(format_signed_percent)
            .map_err(|e| FetchError::Missing(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "price_history"
    }
}

/// Pair timestamps with adjusted closes (falling back to plain closes),
/// skipping gaps. Output stays in upstream order (oldest first).
pub fn parse_chart(json: &Value) -> Result<Vec<PricePoint>, FetchError> {
    let result = json
        .pointer("/chart/result/0")
        .ok_or_else(|| FetchError::Missing("Histórico no encontrado en API".to_string()))?;
    let timestamps = result
        .get("timestamp")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Missing("Fechas del histórico no encontradas".to_string()))?;
    let prices = result
        .pointer("/indicators/adjclose/0/adjclose")
        .or_else(|| result.pointer("/indicators/quote/0/close"))
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Missing("Precios del histórico no encontrados".to_string()))?;

    let points = timestamps
        .iter()
        .zip(prices)
        .filter_map(|(ts, price)| {
            Some(PricePoint {
                ts: ts.as_i64()?,
                price: json_f64(price)?,
            })
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pairs_timestamps_with_adjclose_and_skips_nulls() {
        let body = json!({
            "chart": { "result": [ {
                "timestamp": [100, 200, 300],
                "indicators": {
                    "quote": [ { "close": [1.0, 2.0, 3.0] } ],
                    "adjclose": [ { "adjclose": [10.0, null, 30.0] } ]
                }
            } ] }
        });
        let points = parse_chart(&body).unwrap();
        assert_eq!(
            points,
            vec![
                PricePoint { ts: 100, price: 10.0 },
                PricePoint { ts: 300, price: 30.0 }
            ]
        );
    }

    #[test]
    fn falls_back_to_quote_close() {
        let body = json!({
            "chart": { "result": [ {
                "timestamp": [100],
                "indicators": { "quote": [ { "close": [5.5] } ] }
            } ] }
        });
        assert_eq!(parse_chart(&body).unwrap()[0].price, 5.5);
    }

    #[test]
    fn empty_result_is_missing() {
        let body = json!({ "chart": { "result": [], "error": null } });
        assert_eq!(parse_chart(&body).unwrap_err().kind(), "missing");
    }
}
