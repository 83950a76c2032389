// src/sources/morningstar.rs
//! Morningstar fund API: year-to-date growth and trailing (since inception) return.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::derived::percent::format_signed_percent;
use crate::sources::types::{FetchContext, FetchError, SourceAdapter};
use crate::sources::{get_json, json_f64};

const PERFORMANCE_URL: &str = "https://api-global.morningstar.com/sal-service/v1/fund/performance/v5/{id}?secExchangeList=&limitAge=&hideYTD=false&languageId=es&locale=es&clientId=MDC&benchmarkId=mstarorcat&component=sal-mip-growth-10k&version=4.65.0";
const TRAILING_RETURN_URL: &str = "https://api-global.morningstar.com/sal-service/v1/fund/trailingReturn/v3/{id}/data?duration=quarterly&limitAge=&languageId=es&locale=es&clientId=MDC&benchmarkId=mstarorcat&component=sal-mip-trailing-return&version=4.65.0";

/// Value shown when the API answers but has no figure yet.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    YearToDate,
    TrailingReturn,
}

pub struct MorningstarAdapter {
    client: reqwest::Client,
    endpoint: Endpoint,
    fund_id: String,
    api_key: String,
}

impl MorningstarAdapter {
    pub fn new(client: reqwest::Client, endpoint: Endpoint, fund_id: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            fund_id: fund_id.to_string(),
            api_key,
        }
    }

    pub fn url(&self) -> String {
        let template = match self.endpoint {
            Endpoint::YearToDate => PERFORMANCE_URL,
            Endpoint::TrailingReturn => TRAILING_RETURN_URL,
        };
        template.replace("{id}", &self.fund_id)
    }

    fn headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();
        let fixed = [
            ("accept", "*/*"),
            ("accept-language", "es-ES,es;q=0.8"),
            ("origin", "https://global.morningstar.com"),
            ("referer", "https://global.morningstar.com/"),
            ("sec-fetch-dest", "empty"),
            ("sec-fetch-mode", "cors"),
            ("sec-fetch-site", "same-site"),
        ];
        for (name, value) in fixed {
            h.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        if let Ok(v) = HeaderValue::from_str(&self.api_key) {
            if !self.api_key.is_empty() {
                h.insert(HeaderName::from_static("apikey"), v);
            }
        }
        h
    }
}

#[async_trait]
impl SourceAdapter for MorningstarAdapter {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<String, FetchError> {
        let json = get_json(&self.client, &self.url(), self.headers()).await?;
        match self.endpoint {
            Endpoint::YearToDate => parse_ytd(&json),
            Endpoint::TrailingReturn => parse_trailing_return(&json),
        }
    }

    fn name(&self) -> &'static str {
        match self.endpoint {
            Endpoint::YearToDate => "morningstar_ytd",
            Endpoint::TrailingReturn => "morningstar_trailing",
        }
    }
}

/// Last `datum` of the `fund` series in `table.growth10KReturnData`.
pub fn parse_ytd(json: &Value) -> Result<String, FetchError> {
    let last = json
        .pointer("/table/growth10KReturnData")
        .and_then(Value::as_array)
        .and_then(|series| {
            series
                .iter()
                .find(|item| item.get("label").and_then(Value::as_str) == Some("fund"))
        })
        .and_then(|fund| fund.get("datum"))
        .and_then(Value::as_array)
        .and_then(|datum| datum.last())
        .ok_or_else(|| FetchError::Missing("Dato YTD no encontrado en API".to_string()))?;
    format_last(last)
}

/// Last entry of `netReturn`.
pub fn parse_trailing_return(json: &Value) -> Result<String, FetchError> {
    let last = json
        .get("netReturn")
        .and_then(Value::as_array)
        .and_then(|v| v.last())
        .ok_or_else(|| FetchError::Missing("Dato 'netReturn' no encontrado en API".to_string()))?;
    format_last(last)
}

fn format_last(v: &Value) -> Result<String, FetchError> {
    if v.is_null() {
        return Ok(NOT_AVAILABLE.to_string());
    }
    json_f64(v)
        .map(format_signed_percent)
        .ok_or_else(|| FetchError::Parse(format!("valor no numérico: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ytd_takes_last_fund_datum() {
        let body = json!({
            "table": {
                "growth10KReturnData": [
                    { "label": "category", "datum": [1.0, 2.0] },
                    { "label": "fund", "datum": ["3.10", "12.346"] }
                ]
            }
        });
        assert_eq!(parse_ytd(&body).unwrap(), "+12,35%");
    }

    #[test]
    fn ytd_null_is_not_available() {
        let body = json!({ "table": { "growth10KReturnData": [ { "label": "fund", "datum": [1.0, null] } ] } });
        assert_eq!(parse_ytd(&body).unwrap(), NOT_AVAILABLE);
    }

    #[test]
    fn ytd_without_fund_series_is_missing() {
        let body = json!({ "table": { "growth10KReturnData": [ { "label": "index", "datum": [1.0] } ] } });
        let err = parse_ytd(&body).unwrap_err();
        assert_eq!(err.kind(), "missing");
        assert_eq!(err.to_string(), "Dato YTD no encontrado en API");
    }

    #[test]
    fn trailing_return_takes_last_entry() {
        let body = json!({ "netReturn": [10.2, 11.0, -4.5] });
        assert_eq!(parse_trailing_return(&body).unwrap(), "-4,50%");
    }

    #[test]
    fn trailing_return_non_numeric_is_parse_error() {
        let body = json!({ "netReturn": ["n/d"] });
        assert_eq!(parse_trailing_return(&body).unwrap_err().kind(), "parse");
    }

    #[test]
    fn url_embeds_fund_id() {
        let a = MorningstarAdapter::new(
            reqwest::Client::new(),
            Endpoint::TrailingReturn,
            "F0GBR04UOL",
            String::new(),
        );
        assert!(a.url().contains("/trailingReturn/v3/F0GBR04UOL/data"));
        assert!(a.headers().get("apikey").is_none());
    }
}
