// src/snapshot.rs
//! Public JSON shape of `/all_instrument_data` and its assembly from fetched results.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::Catalog;
use crate::derived::commentary::{sp500_insight, world_insight, Commentary};
use crate::derived::percent::parse_optional;
use crate::market::{market_status, MarketStatus};
use crate::sources::types::SourceResult;

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedSnapshot {
    pub data_fetched_at: String,
    pub instruments: BTreeMap<String, InstrumentView>,
    pub page_commentaries: PageCommentaries,
    pub page_data: BTreeMap<String, PageDataView>,
    pub quote: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentView {
    pub display_name: String,
    pub comment: String,
    pub id_key: String,
    pub percentage_change: Option<String>,
    pub error: Option<String>,
    pub market_status: MarketStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageCommentaries {
    pub sp500_insight: Commentary,
    pub world_insight: Commentary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageDataView {
    pub performance_str: Option<String>,
    pub error: Option<String>,
}

/// Build the response. Every configured key must have a result; a gap means
/// the orchestrator lost a task, which is reported as an internal error.
pub fn assemble(
    catalog: &Catalog,
    results: &BTreeMap<String, SourceResult>,
    now_utc: DateTime<Utc>,
    local: DateTime<Tz>,
    quote: String,
) -> Result<AggregatedSnapshot> {
    let result_for = |key: &str| {
        results
            .get(key)
            .ok_or_else(|| anyhow!("no fetch result for source '{key}'"))
    };

    let mut instruments = BTreeMap::new();
    for spec in &catalog.instruments {
        let r = result_for(&spec.key)?;
        instruments.insert(
            spec.key.clone(),
            InstrumentView {
                display_name: spec.display_name.clone(),
                comment: spec.comment.clone(),
                id_key: spec.key.clone(),
                percentage_change: r.value().map(str::to_string),
                error: r.error().map(str::to_string),
                market_status: market_status(spec.category, &local),
            },
        );
    }

    let mut page_data = BTreeMap::new();
    for spec in &catalog.page_data {
        let r = result_for(&spec.key)?;
        page_data.insert(
            spec.key.clone(),
            PageDataView {
                performance_str: r.value().map(str::to_string),
                error: r.error().map(str::to_string),
            },
        );
    }

    // Missing or unparseable inputs just drop the matching commentary.
    let pct = |key: &str| parse_optional(results.get(key).and_then(SourceResult::value));
    let keys = &catalog.commentary;
    let page_commentaries = PageCommentaries {
        sp500_insight: sp500_insight(
            local.hour(),
            pct(&keys.futures),
            pct(&keys.fx),
            pct(&keys.net_index),
        ),
        world_insight: world_insight(pct(&keys.world)),
    };

    Ok(AggregatedSnapshot {
        data_fetched_at: now_utc.to_rfc3339_opts(SecondsFormat::Micros, false),
        instruments,
        page_commentaries,
        page_data,
        quote,
    })
}
