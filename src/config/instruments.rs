// src/config/instruments.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::market::MarketCategory;

// --- env defaults & names ---
pub const DEFAULT_INSTRUMENTS_CONFIG_PATH: &str = "config/instruments.toml";
pub const ENV_INSTRUMENTS_CONFIG_PATH: &str = "INSTRUMENTS_CONFIG_PATH";
pub const ENV_CACHE_WINDOW_SECS: &str = "CACHE_WINDOW_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_MARKET_TIMEZONE: &str = "MARKET_TIMEZONE";
pub const ENV_MORNINGSTAR_API_KEY: &str = "MORNINGSTAR_API_KEY";

const EMBEDDED_CATALOG: &str = include_str!("../../config/instruments.toml");

fn default_cache_window_secs() -> u64 {
    900
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_timezone() -> String {
    "Europe/Madrid".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_cache_window_secs")]
    pub cache_window_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// IANA name of the reference market timezone.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// "ENV" means: read from MORNINGSTAR_API_KEY.
    #[serde(default = "default_api_key")]
    pub morningstar_api_key: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_window_secs: default_cache_window_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            timezone: default_timezone(),
            morningstar_api_key: default_api_key(),
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    pub fn cache_window(&self) -> Duration {
        Duration::from_secs(self.cache_window_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("unknown timezone '{}': {e}", self.timezone))
    }

    /// Resolved Morningstar key; empty when "ENV" is set but the variable is not.
    pub fn morningstar_api_key(&self) -> String {
        if self.morningstar_api_key.trim().eq_ignore_ascii_case("env") {
            std::env::var(ENV_MORNINGSTAR_API_KEY).unwrap_or_else(|_| {
                tracing::warn!("{ENV_MORNINGSTAR_API_KEY} not set; Morningstar sources will likely fail");
                String::new()
            })
        } else {
            self.morningstar_api_key.clone()
        }
    }
}

/// How one source is fetched. Closed set of transports.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    HtmlSelector {
        url: String,
        selector: String,
        #[serde(default)]
        ensure_percent: bool,
    },
    MorningstarYtd {
        fund_id: String,
    },
    MorningstarTrailing {
        fund_id: String,
    },
    Ticker {
        url: String,
    },
    PriceHistory {
        url: String,
    },
    Fixed {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

/// One tracked instrument with a live percentage change.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentSpec {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub category: MarketCategory,
    #[serde(default)]
    pub cacheable: bool,
    pub source: SourceSpec,
}

/// One page-level performance figure (YTD, rates, annualized returns).
#[derive(Debug, Clone, Deserialize)]
pub struct PageDataSpec {
    pub key: String,
    #[serde(default = "default_true")]
    pub cacheable: bool,
    pub source: SourceSpec,
}

fn default_true() -> bool {
    true
}

/// Which instrument keys feed the page commentaries.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentaryKeys {
    #[serde(default = "default_futures_key")]
    pub futures: String,
    #[serde(default = "default_fx_key")]
    pub fx: String,
    #[serde(default = "default_net_index_key")]
    pub net_index: String,
    #[serde(default = "default_world_key")]
    pub world: String,
}

fn default_futures_key() -> String {
    "sp500_futures".to_string()
}
fn default_fx_key() -> String {
    "usd_eur".to_string()
}
fn default_net_index_key() -> String {
    "sp500_net_eur".to_string()
}
fn default_world_key() -> String {
    "world_net_eur".to_string()
}

impl Default for CommentaryKeys {
    fn default() -> Self {
        Self {
            futures: default_futures_key(),
            fx: default_fx_key(),
            net_index: default_net_index_key(),
            world: default_world_key(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotesSpec {
    /// No URL: the fallback quote is always served.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_quote_selector")]
    pub selector: String,
}

fn default_quote_selector() -> String {
    "div.thrv_tw_quote p".to_string()
}

/// Everything the service fetches, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub settings: Settings,
    pub instruments: Vec<InstrumentSpec>,
    #[serde(default)]
    pub page_data: Vec<PageDataSpec>,
    #[serde(default)]
    pub commentary: CommentaryKeys,
    #[serde(default)]
    pub quotes: QuotesSpec,
}

impl Catalog {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(s).context("parsing instrument catalog")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading instrument catalog from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $INSTRUMENTS_CONFIG_PATH
    /// 2) config/instruments.toml
    /// 3) the catalog compiled into the binary
    pub fn load_default() -> Result<Self> {
        let mut catalog = if let Ok(p) = std::env::var(ENV_INSTRUMENTS_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_INSTRUMENTS_CONFIG_PATH} points to non-existent path");
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_INSTRUMENTS_CONFIG_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_INSTRUMENTS_CONFIG_PATH))?
        } else {
            Self::from_toml_str(EMBEDDED_CATALOG)?
        };
        catalog.apply_env_overrides();
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_secs_env(std::env::var(ENV_CACHE_WINDOW_SECS).ok()) {
            self.settings.cache_window_secs = v;
        }
        if let Some(v) = parse_secs_env(std::env::var(ENV_FETCH_TIMEOUT_SECS).ok()) {
            self.settings.fetch_timeout_secs = v.max(1);
        }
        if let Ok(tz) = std::env::var(ENV_MARKET_TIMEZONE) {
            if !tz.trim().is_empty() {
                self.settings.timezone = tz.trim().to_string();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        self.settings.tz()?;
        if self.settings.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be positive");
        }
        let mut seen = HashSet::new();
        let keys = self
            .instruments
            .iter()
            .map(|i| &i.key)
            .chain(self.page_data.iter().map(|p| &p.key));
        for key in keys {
            if key.trim().is_empty() {
                bail!("source key must not be empty");
            }
            if !seen.insert(key.as_str()) {
                bail!("duplicate source key '{key}'");
            }
        }
        Ok(())
    }

    pub fn instrument(&self, key: &str) -> Option<&InstrumentSpec> {
        self.instruments.iter().find(|i| i.key == key)
    }
}

fn parse_secs_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
}
