//! Card normalizer
//!
//! Turns raw feed cards into [`NormalizedCard`]s: required-field checks,
//! crypt/library classification, group and cost normalization, the
//! set/scan join and ruling reference linking.

use crate::core::card::is_crypt_types;
use crate::core::{CardSet, CostValue, NameList, NormalizedCard, Ruling, RulingReference, SetInfo};
use crate::loader::raw::{RawCard, RawFeed, RawRulings, RawScalar};
use crate::loader::sets::{collect_unique_sets, SetCanonicalizer};
use crate::profile::OutputProfile;
use crate::{ExportError, Result};
use tracing::{debug, warn};

/// Group value meaning "playable with any group"
pub const ANY_GROUP: &str = "ANY";

/// Result of normalizing a whole feed
#[derive(Debug, Default)]
pub struct NormalizeReport {
    /// Normalized cards, in feed order
    pub cards: Vec<NormalizedCard>,
    /// Unique sets across the normalized cards
    pub sets: Vec<SetInfo>,
    /// Records that were skipped, with the reason
    pub skipped: Vec<ExportError>,
    /// Set names that fell back to the unknown code
    pub unknown_sets: Vec<String>,
}

/// Normalizer configured by an output profile
pub struct CardNormalizer<'p> {
    profile: &'p OutputProfile,
    sets: SetCanonicalizer,
}

impl<'p> CardNormalizer<'p> {
    pub fn new(profile: &'p OutputProfile) -> Self {
        CardNormalizer {
            profile,
            sets: SetCanonicalizer::new(),
        }
    }

    /// Normalize a single raw card
    ///
    /// `index` is the card's position in the feed and only feeds diagnostics.
    pub fn normalize(&mut self, index: usize, raw: &RawCard) -> Result<NormalizedCard> {
        let malformed = |reason: String| ExportError::MalformedRecord {
            index,
            name: raw.name.clone(),
            reason,
        };

        let name = raw
            .name
            .clone()
            .ok_or_else(|| malformed("missing required field `name`".to_string()))?;
        let types = raw
            .types
            .as_ref()
            .ok_or_else(|| malformed("missing required field `types`".to_string()))?;
        let url = raw
            .url
            .as_ref()
            .ok_or_else(|| malformed("missing required field `url`".to_string()))?;

        let group = raw
            .group
            .as_ref()
            .map(normalize_group)
            .transpose()
            .map_err(malformed)?;
        let capacity = raw
            .capacity
            .as_ref()
            .map(normalize_capacity)
            .transpose()
            .map_err(malformed)?;
        let pool_cost = raw
            .pool_cost
            .as_ref()
            .map(|c| normalize_cost("pool_cost", c))
            .transpose()
            .map_err(malformed)?;
        let blood_cost = raw
            .blood_cost
            .as_ref()
            .map(|c| normalize_cost("blood_cost", c))
            .transpose()
            .map_err(malformed)?;

        let banned = match &raw.banned {
            Some(RawScalar::Flag(false)) | None => None,
            Some(value) => Some(value.to_string()),
        };

        let types: NameList = types.iter().cloned().collect();

        Ok(self.profile.strip(NormalizedCard {
            id: raw.id,
            printed_name: raw.printed_name.clone(),
            url: Some(url.clone()),
            is_crypt: is_crypt_types(types.as_slice()),
            types,
            clans: name_list(raw.clans.as_deref()),
            disciplines: name_list(raw.disciplines.as_deref()),
            group,
            capacity,
            pool_cost,
            blood_cost,
            banned,
            is_token: raw.token,
            text: raw.card_text.clone(),
            sets: self.join_sets(raw),
            rulings: match &raw.rulings {
                Some(rulings) if self.profile.include_rulings => link_rulings(rulings),
                _ => Vec::new(),
            },
            name,
        }))
    }

    /// Normalize every entry of a feed, skipping (and reporting) bad records
    pub fn normalize_feed(mut self, feed: &RawFeed) -> NormalizeReport {
        let mut report = NormalizeReport::default();
        let mut kept: Vec<&RawCard> = Vec::with_capacity(feed.len());

        for (index, entry) in feed.entries.iter().enumerate() {
            let raw = match entry {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("skipping card: {e}");
                    report.skipped.push(clone_malformed(e, index));
                    continue;
                }
            };

            if raw.token && !self.profile.include_tokens {
                debug!(card = raw.display_name(), "dropping token, profile excludes tokens");
                continue;
            }

            match self.normalize(index, raw) {
                Ok(card) => {
                    report.cards.push(card);
                    kept.push(raw);
                }
                Err(e) => {
                    warn!("skipping card: {e}");
                    report.skipped.push(e);
                }
            }
        }

        report.sets = collect_unique_sets(kept, &mut self.sets);
        report.unknown_sets = self.sets.unknown_names().to_vec();
        report
    }

    /// Pair each set the card appears in with the scan for that set
    ///
    /// The scan comes from the feed's scan map under the same (original)
    /// set name, else from the set's first printing that carries one. Sets
    /// without any scan are dropped.
    fn join_sets(&mut self, raw: &RawCard) -> Vec<CardSet> {
        let Some(sets) = &raw.sets else {
            return Vec::new();
        };

        let mut joined = Vec::with_capacity(sets.len());
        for (set_name, printings) in sets.iter() {
            let scan = raw
                .scans
                .as_ref()
                .and_then(|scans| scans.get(set_name).cloned())
                .or_else(|| printings.iter().find_map(|p| p.scan.clone()));

            match scan {
                Some(pic_url) => joined.push(CardSet {
                    name: self.sets.canonicalize(set_name).to_string(),
                    pic_url,
                }),
                None => debug!(
                    card = raw.display_name(),
                    set = set_name,
                    "no scan for set, dropping it"
                ),
            }
        }
        joined
    }
}

/// Normalize a raw group value: "ANY" becomes 0, numbers pass through
pub fn normalize_group(value: &RawScalar) -> std::result::Result<u32, String> {
    match value {
        RawScalar::Text(text) if text.trim() == ANY_GROUP => Ok(0),
        RawScalar::Text(text) => text
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid group '{text}'")),
        RawScalar::Int(n) => u32::try_from(*n).map_err(|_| format!("invalid group {n}")),
        RawScalar::Flag(b) => Err(format!("invalid group {b}")),
    }
}

fn normalize_capacity(value: &RawScalar) -> std::result::Result<u32, String> {
    match value {
        RawScalar::Int(n) => u32::try_from(*n).map_err(|_| format!("invalid capacity {n}")),
        RawScalar::Text(text) => text
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid capacity '{text}'")),
        RawScalar::Flag(b) => Err(format!("invalid capacity {b}")),
    }
}

fn normalize_cost(field: &str, value: &RawScalar) -> std::result::Result<CostValue, String> {
    match value {
        RawScalar::Int(n) => u32::try_from(*n)
            .map(CostValue::Fixed)
            .map_err(|_| format!("invalid {field} {n}")),
        RawScalar::Text(text) => Ok(CostValue::parse(text)),
        RawScalar::Flag(b) => Err(format!("invalid {field} {b}")),
    }
}

fn name_list(values: Option<&[String]>) -> NameList {
    values.map(|v| v.iter().cloned().collect()).unwrap_or_default()
}

/// Flatten rulings, attaching each reference whose tag occurs in the text
///
/// The match is a plain substring test, so a short tag can link to a ruling
/// that merely contains the same characters. Consumers rely on this linkage
/// as published.
pub fn link_rulings(rulings: &RawRulings) -> Vec<Ruling> {
    match rulings {
        RawRulings::Grouped { text, links } => text
            .iter()
            .map(|ruling_text| Ruling {
                text: ruling_text.clone(),
                references: links
                    .iter()
                    .filter(|(tag, _)| ruling_text.contains(*tag))
                    .map(|(tag, url)| RulingReference {
                        label: tag.to_string(),
                        url: url.clone(),
                    })
                    .collect(),
            })
            .collect(),
        RawRulings::Listed(list) => list
            .iter()
            .map(|ruling| Ruling {
                text: ruling.text.clone(),
                references: ruling
                    .references
                    .iter()
                    .filter(|r| ruling.text.contains(r.label.as_str()))
                    .map(|r| RulingReference {
                        label: r.label.clone(),
                        url: r.url.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Feed entries that failed to decode are always `MalformedRecord`s; the
/// error type is not `Clone`, so rebuild it for the report.
fn clone_malformed(err: &ExportError, index: usize) -> ExportError {
    match err {
        ExportError::MalformedRecord {
            index,
            name,
            reason,
        } => ExportError::MalformedRecord {
            index: *index,
            name: name.clone(),
            reason: reason.clone(),
        },
        other => ExportError::MalformedRecord {
            index,
            name: None,
            reason: other.to_string(),
        },
    }
}
