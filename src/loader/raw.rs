//! Raw card feed records
//!
//! Mirrors the KRCG JSON card objects loosely: every field is optional at
//! this level so a missing required field can be reported per card by the
//! normalizer instead of failing the whole document.

use crate::{ExportError, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;
use std::marker::PhantomData;

/// JSON object kept in feed order
///
/// Set, scan and ruling-link mappings are emitted in the order the feed
/// lists them, so a `HashMap` would lose information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap {
            entries: Vec::new(),
        }
    }

    /// Insert a value, replacing (in place) any earlier value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Scalar that the feed writes either as a number or as a string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Int(i64),
    Text(String),
    Flag(bool),
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScalar::Int(n) => write!(f, "{n}"),
            RawScalar::Text(s) => f.write_str(s),
            RawScalar::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// One printing of a card within a set
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPrinting {
    #[serde(default)]
    pub release_date: Option<String>,

    /// Scan reference carried on the printing itself
    #[serde(default, alias = "scan_url")]
    pub scan: Option<String>,
}

/// Reference in the list form of rulings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawReference {
    #[serde(alias = "tag")]
    pub label: String,
    pub url: String,
}

/// Ruling in the list form of rulings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRuling {
    pub text: String,
    #[serde(default, alias = "links")]
    pub references: Vec<RawReference>,
}

/// The two shapes rulings come in
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawRulings {
    /// KRCG shape: all ruling texts, plus one tag -> URL map for the card
    Grouped {
        text: Vec<String>,
        #[serde(default)]
        links: OrderedMap<String>,
    },
    /// One entry per ruling, each with its own candidate references
    Listed(Vec<RawRuling>),
}

/// Card object as published by the feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub printed_name: Option<String>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub clans: Option<Vec<String>>,
    #[serde(default)]
    pub group: Option<RawScalar>,
    #[serde(default)]
    pub capacity: Option<RawScalar>,
    #[serde(default)]
    pub disciplines: Option<Vec<String>>,
    #[serde(default)]
    pub banned: Option<RawScalar>,
    #[serde(default)]
    pub pool_cost: Option<RawScalar>,
    #[serde(default)]
    pub blood_cost: Option<RawScalar>,
    #[serde(default)]
    pub card_text: Option<String>,
    #[serde(default)]
    pub sets: Option<OrderedMap<Vec<RawPrinting>>>,
    #[serde(default)]
    pub scans: Option<OrderedMap<String>>,
    #[serde(default)]
    pub rulings: Option<RawRulings>,
    #[serde(default)]
    pub token: bool,
}

impl RawCard {
    /// Name used in diagnostics
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A feed entry: either a card or the reason it could not be read
pub type RawEntry = Result<RawCard>;

/// Best-effort name of an entry that failed to decode
fn entry_name(element: &RawValue) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(element.get()).ok()?;
    value.get("name")?.as_str().map(str::to_string)
}

/// A fully buffered feed snapshot
#[derive(Debug, Default)]
pub struct RawFeed {
    pub entries: Vec<RawEntry>,
}

impl RawFeed {
    /// Parse the feed document
    ///
    /// The document must be a JSON array; anything else is fatal. Each
    /// element is decoded on its own so one badly shaped card only costs
    /// that card.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        // Elements stay raw text until decoded, so object key order is
        // the feed's order when `OrderedMap` sees it
        let elements: Vec<Box<RawValue>> = serde_json::from_slice(bytes).map_err(|e| {
            ExportError::SourceUnavailable(format!("feed is not a JSON array of cards: {e}"))
        })?;

        let entries = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                serde_json::from_str::<RawCard>(element.get()).map_err(|e| {
                    ExportError::MalformedRecord {
                        index,
                        name: entry_name(element),
                        reason: e.to_string(),
                    }
                })
            })
            .collect();

        Ok(RawFeed { entries })
    }

    pub fn from_cards(cards: Vec<RawCard>) -> Self {
        RawFeed {
            entries: cards.into_iter().map(Ok).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
