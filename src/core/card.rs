//! Normalized card records

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Card types that place a card in the crypt
pub const CRYPT_TYPES: [&str; 2] = ["Vampire", "Imbued"];

/// Short list of names (types, clans, disciplines)
///
/// Most cards carry one or two entries, so these stay inline.
pub type NameList = SmallVec<[String; 2]>;

/// Pool or blood cost of a library card
///
/// Most costs are plain numbers; a few cards cost "X".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CostValue {
    Fixed(u32),
    Variable(String),
}

impl CostValue {
    /// Parse a cost from its text form, keeping non-numeric costs verbatim
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<u32>() {
            Ok(value) => CostValue::Fixed(value),
            Err(_) => CostValue::Variable(text.to_string()),
        }
    }
}

impl fmt::Display for CostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostValue::Fixed(value) => write!(f, "{value}"),
            CostValue::Variable(text) => f.write_str(text),
        }
    }
}

/// One printing of a card: canonical set code and its scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSet {
    /// Canonical short set code (e.g., "V5")
    pub name: String,

    /// Scan (image) URL for this printing
    #[serde(rename = "picURL")]
    pub pic_url: String,
}

/// Reference attached to a ruling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulingReference {
    /// Reference tag as it appears in the ruling text (e.g., "[LSJ 20040518]")
    #[serde(rename = "tag")]
    pub label: String,

    pub url: String,
}

/// Official ruling with the references quoted in its text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruling {
    pub text: String,

    #[serde(rename = "links", default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<RulingReference>,
}

/// Canonical card record
///
/// Field order here is the output order of every emitter. Absent optional
/// fields are `None` (or an empty list) and are never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCard {
    /// Stable numeric identifier from the feed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printed_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub types: NameList,

    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub clans: NameList,

    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub disciplines: NameList,

    /// Crypt grouping; 0 means playable with any group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_cost: Option<CostValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_cost: Option<CostValue>,

    /// Date the card was banned from tournament play
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned: Option<String>,

    pub is_crypt: bool,

    #[serde(default)]
    pub is_token: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<CardSet>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rulings: Vec<Ruling>,
}

impl NormalizedCard {
    /// Create a bare card with only a name and its types
    pub fn new(name: impl Into<String>, types: NameList) -> Self {
        let is_crypt = is_crypt_types(types.as_slice());
        NormalizedCard {
            id: None,
            name: name.into(),
            printed_name: None,
            url: None,
            types,
            clans: NameList::new(),
            disciplines: NameList::new(),
            group: None,
            capacity: None,
            pool_cost: None,
            blood_cost: None,
            banned: None,
            is_crypt,
            is_token: false,
            text: None,
            sets: Vec::new(),
            rulings: Vec::new(),
        }
    }
}

/// The crypt/library discriminator: true iff a crypt type is present
pub fn is_crypt_types<S: AsRef<str>>(types: &[S]) -> bool {
    types
        .iter()
        .any(|t| CRYPT_TYPES.contains(&t.as_ref()))
}
