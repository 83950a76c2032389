// src/sources/html.rs
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};

use crate::sources::get_text;
use crate::sources::types::{FetchContext, FetchError, SourceAdapter};

/// Text of the first element matching `selector` on a fetched page.
pub struct HtmlSelectorAdapter {
    client: reqwest::Client,
    url: String,
    selector: Selector,
    ensure_percent: bool,
}

impl HtmlSelectorAdapter {
    pub fn new(
        client: reqwest::Client,
        url: &str,
        selector: &str,
        ensure_percent: bool,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            url: url.to_string(),
            selector: parse_selector(selector)?,
            ensure_percent,
        })
    }

    /// Expand `{year}` and `{today}` (dd-mm-YYYY) in the configured URL.
    pub fn render_url(&self, now: &DateTime<Tz>) -> String {
        render_url_template(&self.url, now)
    }

    /// Pull the display value out of an already-fetched page.
    pub fn extract(&self, body: &str) -> Result<String, FetchError> {
        let mut text = first_text(body, &self.selector)
            .ok_or_else(|| FetchError::Missing("Elemento no encontrado".to_string()))?;
        if self.ensure_percent && !text.contains('%') {
            text.push('%');
        }
        Ok(text)
    }
}

#[async_trait]
impl SourceAdapter for HtmlSelectorAdapter {
    async fn fetch(&self, ctx: &FetchContext) -> Result<String, FetchError> {
        let url = self.render_url(&ctx.now);
        let body = get_text(&self.client, &url, HeaderMap::new()).await?;
        self.extract(&body)
    }

    fn name(&self) -> &'static str {
        "html_selector"
    }
}

pub fn render_url_template(template: &str, now: &DateTime<Tz>) -> String {
    template
        .replace("{year}", &now.format("%Y").to_string())
        .replace("{today}", &now.format("%d-%m-%Y").to_string())
}

/// Parse a configured CSS selector once, at startup.
pub fn parse_selector(selector: &str) -> anyhow::Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid CSS selector '{selector}': {e:?}"))
}

/// Stripped text of the first match, or `None` when nothing matches.
pub fn first_text(body: &str, selector: &Selector) -> Option<String> {
    all_texts(body, selector, "").into_iter().next()
}

/// Stripped text of every match. Text nodes inside one element are trimmed and
/// joined with `separator`; NBSP becomes a plain space.
pub fn all_texts(body: &str, selector: &Selector, separator: &str) -> Vec<String> {
    Html::parse_document(body)
        .select(selector)
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(separator)
                .replace('\u{a0}', " ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const INVESTING_PAGE: &str = r#"
        <html><body>
          <div class="price">
            <span data-test="instrument-price-last">5.321,10</span>
            <span data-test="instrument-price-change-percent">
              (<!-- -->+0,42<!-- -->%)
            </span>
          </div>
        </body></html>"#;

    fn adapter(selector: &str, ensure_percent: bool) -> HtmlSelectorAdapter {
        HtmlSelectorAdapter::new(
            reqwest::Client::new(),
            "https://example.test",
            selector,
            ensure_percent,
        )
        .expect("valid selector")
    }

    #[test]
    fn extracts_first_match_stripped() {
        let a = adapter(r#"span[data-test="instrument-price-change-percent"]"#, false);
        assert_eq!(a.extract(INVESTING_PAGE).unwrap(), "(+0,42%)");
    }

    #[test]
    fn missing_element_is_reported() {
        let a = adapter("td strong", false);
        let err = a.extract(INVESTING_PAGE).unwrap_err();
        assert_eq!(err.to_string(), "Elemento no encontrado");
    }

    #[test]
    fn percent_suffix_added_only_when_absent() {
        let a = adapter("td strong", true);
        let page = "<table><tr><td><strong>1.924</strong></td></tr></table>";
        assert_eq!(a.extract(page).unwrap(), "1.924%");

        let page = "<table><tr><td><strong>-2,10%</strong></td></tr></table>";
        assert_eq!(a.extract(page).unwrap(), "-2,10%");
    }

    #[test]
    fn nbsp_becomes_space() {
        let page = "<table><tr><td class=\"border-left js-plusmin\">+7,3\u{a0}%</td></tr></table>";
        let a = adapter("td.border-left.js-plusmin", false);
        assert_eq!(a.extract(page).unwrap(), "+7,3 %");
    }

    #[test]
    fn invalid_selector_fails_at_construction() {
        let res = HtmlSelectorAdapter::new(reqwest::Client::new(), "https://x", "td[[", false);
        assert!(res.is_err());
    }

    #[test]
    fn one_parsed_selector_serves_many_pages() {
        let a = adapter("td strong", false);
        let first = "<table><tr><td><strong>+1,00%</strong></td></tr></table>";
        let second = "<table><tr><td><strong>-0,25%</strong></td></tr></table>";
        assert_eq!(a.extract(first).unwrap(), "+1,00%");
        assert_eq!(a.extract(second).unwrap(), "-0,25%");

        let sel = parse_selector("td strong").unwrap();
        assert_eq!(first_text("<p>nothing</p>", &sel), None);
    }

    #[test]
    fn url_template_uses_local_date() {
        let now = chrono_tz::Europe::Madrid
            .with_ymd_and_hms(2025, 3, 7, 9, 0, 0)
            .unwrap();
        let url = render_url_template("https://x/stats?from=01-01-{year}&to={today}", &now);
        assert_eq!(url, "https://x/stats?from=01-01-2025&to=07-03-2025");
    }
}
