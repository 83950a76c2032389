// src/derived/mod.rs
//! Pure computations over already-fetched values: no I/O, no awaiting.

pub mod cagr;
pub mod commentary;
pub mod percent;

pub use cagr::{compound_annual_growth_rate, CagrError, PricePoint};
pub use commentary::{sp500_insight, world_insight, Commentary, Sentiment};
pub use percent::{format_signed_percent, parse_percentage};
