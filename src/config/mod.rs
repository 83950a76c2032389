// src/config/mod.rs
pub mod instruments;

pub use instruments::{
    Catalog, CommentaryKeys, InstrumentSpec, PageDataSpec, QuotesSpec, Settings, SourceSpec,
};
