//! Core card database records
//!
//! Strongly typed shapes shared by the normalizer and every emitter.

pub mod card;
pub mod metadata;
pub mod set;

pub use card::{CardSet, CostValue, NameList, NormalizedCard, Ruling, RulingReference};
pub use metadata::ExportMetadata;
pub use set::SetInfo;
