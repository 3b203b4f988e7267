//! Feed loading and normalization
//!
//! Raw KRCG card objects in, normalized card database out.

pub mod card;
pub mod database;
pub mod feed;
pub mod raw;
pub mod sets;
pub mod tokens;

pub use card::{CardNormalizer, NormalizeReport};
pub use database::{partition, CardDatabase, Partition};
pub use feed::{load_feed, SourceLocation};
pub use raw::{RawCard, RawFeed};
pub use sets::{canonicalize, collect_unique_sets, SetCanonicalizer, UNKNOWN_SET_CODE};
