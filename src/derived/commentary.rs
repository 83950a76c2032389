// src/derived/commentary.rs
//! Page commentaries derived from the fetched index percentages.

use serde::Serialize;

use crate::derived::percent::format_signed_percent;

/// Local hours [start, end) in which the predicted-open line replaces the
/// live index commentary.
pub const PRE_MARKET_HOURS: (u32, u32) = (8, 15);

const SP500_STRONG: f64 = 0.50;
const WORLD_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    fn of_sign(v: f64) -> Self {
        if v > 0.0 {
            Sentiment::Positive
        } else if v < 0.0 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commentary {
    pub text: String,
    pub sentiment: Sentiment,
}

impl Commentary {
    fn new(text: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            text: text.into(),
            sentiment,
        }
    }

    /// No usable data: empty text, neutral.
    pub fn empty() -> Self {
        Self::new("", Sentiment::Neutral)
    }
}

pub fn is_pre_market(local_hour: u32) -> bool {
    (PRE_MARKET_HOURS.0..PRE_MARKET_HOURS.1).contains(&local_hour)
}

/// S&P 500 line. In the pre-market window, futures + FX give the predicted
/// open; otherwise (or when either is missing) the net EUR index is bucketed.
pub fn sp500_insight(
    local_hour: u32,
    futures_pct: Option<f64>,
    fx_pct: Option<f64>,
    net_index_pct: Option<f64>,
) -> Commentary {
    if is_pre_market(local_hour) {
        if let (Some(futures), Some(fx)) = (futures_pct, fx_pct) {
            return predicted_open(futures + fx);
        }
    }
    net_index_pct.map(sp500_tier).unwrap_or_else(Commentary::empty)
}

fn predicted_open(predicted: f64) -> Commentary {
    Commentary::new(
        format!(
            "S&P 500: Se prevé que abra sobre {}.",
            format_signed_percent(predicted)
        ),
        Sentiment::of_sign(predicted),
    )
}

fn sp500_tier(pct: f64) -> Commentary {
    use Sentiment::*;
    if pct > SP500_STRONG {
        Commentary::new("S&P 500 (en €): ¡Pinta bien la cosa, se viene verde positivo!", Positive)
    } else if pct > 0.0 {
        Commentary::new("S&P 500 (en €): Verde tímido.", Positive)
    } else if pct == 0.0 {
        Commentary::new("S&P 500 (en €): Cotiza plano actualmente.", Neutral)
    } else if pct >= -SP500_STRONG {
        Commentary::new("S&P 500 (en €): Rojo tímido.", Negative)
    } else {
        Commentary::new("S&P 500 (en €): Pinta mal, parece que se viene un buen rojo hoy.", Negative)
    }
}

/// MSCI World line, three tiers around ±0.05.
pub fn world_insight(world_pct: Option<f64>) -> Commentary {
    let Some(pct) = world_pct else {
        return Commentary::empty();
    };
    if pct > WORLD_BAND {
        Commentary::new(
            "MSCI World (en €): ¡Pinta bien la cosa, parece que se viene verde!",
            Sentiment::Positive,
        )
    } else if pct < -WORLD_BAND {
        Commentary::new(
            "MSCI World (en €): Pinta mal, parece que se viene rojo hoy",
            Sentiment::Negative,
        )
    } else {
        Commentary::new("MSCI World (en €): Se mantiene estable.", Sentiment::Neutral)
    }
}
