//! # Market status
//! Open/closed classification from local wall-clock time in the reference
//! timezone (Europe/Madrid by default). No holiday calendar.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// US cash session in Madrid time, [open, close).
pub const US_SESSION_OPEN: (u32, u32) = (15, 30);
pub const US_SESSION_CLOSE: (u32, u32) = (22, 0);

/// How an instrument trades, which decides how its status is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCategory {
    /// Weekday intraday session only (cash indices).
    Scheduled,
    /// Trades around the clock on weekdays (futures, FX).
    ContinuousWeekday,
    /// Never closes (crypto).
    AlwaysOn,
    #[default]
    Unclassified,
}

/// Wire labels are the Spanish ones the dashboard expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketStatus {
    #[serde(rename = "ABIERTO")]
    Open,
    #[serde(rename = "CERRADO")]
    Closed,
    #[serde(rename = "ACTIVO")]
    Active,
    #[serde(rename = "")]
    Unclassified,
}

impl MarketStatus {
    pub fn label(self) -> &'static str {
        match self {
            MarketStatus::Open => "ABIERTO",
            MarketStatus::Closed => "CERRADO",
            MarketStatus::Active => "ACTIVO",
            MarketStatus::Unclassified => "",
        }
    }
}

pub fn market_status<T: Datelike + Timelike>(category: MarketCategory, local: &T) -> MarketStatus {
    let is_weekday = local.weekday().number_from_monday() <= 5;
    match category {
        MarketCategory::Scheduled => {
            if is_weekday && in_us_session(local.hour(), local.minute()) {
                MarketStatus::Open
            } else {
                MarketStatus::Closed
            }
        }
        MarketCategory::ContinuousWeekday => {
            if is_weekday {
                MarketStatus::Active
            } else {
                MarketStatus::Closed
            }
        }
        MarketCategory::AlwaysOn => MarketStatus::Active,
        MarketCategory::Unclassified => MarketStatus::Unclassified,
    }
}

fn in_us_session(hour: u32, minute: u32) -> bool {
    let t = (hour, minute);
    US_SESSION_OPEN <= t && t < US_SESSION_CLOSE
}

/// Convert a UTC instant to the reference timezone.
pub fn to_local(now: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    now.with_timezone(&tz)
}
