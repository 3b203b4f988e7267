//! Set name canonicalization
//!
//! Maps the feed's full expansion names onto the short codes used by the
//! card database. The table is closed: every name yields some code, with
//! unmapped names falling back to [`UNKNOWN_SET_CODE`].

use crate::core::SetInfo;
use crate::loader::raw::RawCard;
use rustc_hash::FxHashSet;
use tracing::warn;

/// Code for set names missing from the table
pub const UNKNOWN_SET_CODE: &str = "XXX";

/// Bucket shared by every promotional printing
pub const PROMO_SET: &str = "Promo";

/// Promotional releases whose names do not say "promo"
const PROMO_EVENT_NAMES: [&str; 2] = ["2015 Storyline Rewards", "2018 Humble Bundle"];

/// Collapse promotional set names into the single [`PROMO_SET`] bucket
pub fn promo_bucket(name: &str) -> &str {
    if name.to_lowercase().contains("promo") || PROMO_EVENT_NAMES.contains(&name) {
        PROMO_SET
    } else {
        name
    }
}

/// Short code for a (bucketed) full set name
pub fn lookup_code(name: &str) -> Option<&'static str> {
    let code = match name {
        "Jyhad" => "Jyhad",
        "Vampire: The Eternal Struggle" => "V:TES",
        "Dark Sovereigns" => "DS",
        "Ancient Hearts" => "AH",
        "Sabbat" => "Sabbat",
        "Sabbat War" => "SW",
        "Final Nights" => "FN",
        "Bloodlines" => "BL",
        "Camarilla Edition" => "CE",
        "Anarchs" => "Anarchs",
        "Black Hand" => "BH",
        "Gehenna" => "Gehenna",
        "Tenth Anniversary" => "Tenth",
        "Kindred Most Wanted" => "KMW",
        "Legacies of Blood" => "LoB",
        "Nights of Reckoning" => "NoR",
        "Third Edition" => "Third",
        "Sword of Caine" => "SoC",
        "Lords of the Night" => "LotN",
        "Blood Shadowed Court" => "BSC",
        "Twilight Rebellion" => "TR",
        "Keepers of Tradition" => "KoT",
        "Ebony Kingdom" => "EK",
        "Heirs to the Blood" => "HttB",
        "Danse Macabre" => "DM",
        "The Unaligned" => "TA",
        "Anarch Unbound" => "AU",
        "Lost Kindred" => "LK",
        "Sabbat Preconstructed" => "SP",
        "Fifth Edition" => "V5",
        "Fifth Edition (Anarch)" => "V5A",
        "Fifth Edition (Companion)" => "V5C",
        "Shadows of Berlin" => "SoB",
        "New Blood" => "NB",
        "New Blood II" => "NB2",
        "Fall of London" => "FoL",
        "Anthology" => "Ath",
        "Echoes of Gehenna" => "EoG",
        "Keepers of Tradition Reprint" => "KoTR",
        "Heirs to the Blood Reprint" => "HttBR",
        "First Blood" => "1e",
        "Twenty-Fifth Anniversary" => "25th",
        "Print on Demand" => "POD",
        "Promo" => "Promo",
        _ => return None,
    };
    Some(code)
}

/// Canonical short code for any full set name from the feed
///
/// Never fails: unmapped names yield [`UNKNOWN_SET_CODE`].
pub fn canonicalize(name: &str) -> &'static str {
    lookup_code(promo_bucket(name)).unwrap_or(UNKNOWN_SET_CODE)
}

/// Canonicalizer that reports each unmapped set name once
#[derive(Debug, Default)]
pub struct SetCanonicalizer {
    unknown: FxHashSet<String>,
    unknown_order: Vec<String>,
}

impl SetCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonicalize(&mut self, name: &str) -> &'static str {
        let bucket = promo_bucket(name);
        match lookup_code(bucket) {
            Some(code) => code,
            None => {
                if self.unknown.insert(bucket.to_string()) {
                    warn!(set = bucket, "unknown set name, using code {UNKNOWN_SET_CODE}");
                    self.unknown_order.push(bucket.to_string());
                }
                UNKNOWN_SET_CODE
            }
        }
    }

    /// Unmapped names seen so far, in first-seen order
    pub fn unknown_names(&self) -> &[String] {
        &self.unknown_order
    }
}

/// Unique sets across all cards, in first-seen order
///
/// Dedups on the promo-bucketed name, so every promotional release shares
/// one entry. The release date comes from the first printing of the first
/// occurrence and is left out when that printing has none.
pub fn collect_unique_sets<'a>(
    cards: impl IntoIterator<Item = &'a RawCard>,
    canonicalizer: &mut SetCanonicalizer,
) -> Vec<SetInfo> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut found = Vec::new();

    for card in cards {
        let Some(sets) = &card.sets else {
            continue;
        };
        for (set_name, printings) in sets.iter() {
            let bucket = promo_bucket(set_name);
            if !seen.insert(bucket) {
                continue;
            }
            found.push(SetInfo {
                code: canonicalizer.canonicalize(bucket).to_string(),
                name: bucket.to_string(),
                release_date: printings.first().and_then(|p| p.release_date.clone()),
            });
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::raw::{OrderedMap, RawPrinting};

    fn printing(date: Option<&str>) -> RawPrinting {
        RawPrinting {
            release_date: date.map(str::to_string),
            scan: None,
        }
    }

    fn card_in_sets(sets: &[(&str, Option<&str>)]) -> RawCard {
        RawCard {
            sets: Some(
                sets.iter()
                    .map(|(name, date)| (*name, vec![printing(*date)]))
                    .collect::<OrderedMap<_>>(),
            ),
            ..RawCard::default()
        }
    }

    #[test]
    fn test_canonicalize_known_names() {
        assert_eq!(canonicalize("Fifth Edition"), "V5");
        assert_eq!(canonicalize("Jyhad"), "Jyhad");
        assert_eq!(canonicalize("Twenty-Fifth Anniversary"), "25th");
    }

    #[test]
    fn test_canonicalize_promos() {
        assert_eq!(canonicalize("2015 Storyline Rewards"), "Promo");
        assert_eq!(canonicalize("2018 Humble Bundle"), "Promo");
        assert_eq!(canonicalize("Promo Pack 1"), "Promo");
        assert_eq!(canonicalize("2019 PROMO Pack"), "Promo");
    }

    #[test]
    fn test_canonicalize_unknown_never_fails() {
        assert_eq!(
            canonicalize("Some Brand New Expansion Nobody Mapped"),
            UNKNOWN_SET_CODE
        );
        assert_eq!(canonicalize(""), UNKNOWN_SET_CODE);
    }

    #[test]
    fn test_unknown_names_recorded_once() {
        let mut canon = SetCanonicalizer::new();
        assert_eq!(canon.canonicalize("Mystery Set"), "XXX");
        assert_eq!(canon.canonicalize("Mystery Set"), "XXX");
        assert_eq!(canon.canonicalize("Fifth Edition"), "V5");
        assert_eq!(canon.unknown_names(), &["Mystery Set".to_string()]);
    }

    #[test]
    fn test_collect_unique_sets_dedups_promo_buckets() {
        let cards = vec![
            card_in_sets(&[("Fifth Edition", Some("2020-11-30")), ("Promo Pack 1", None)]),
            card_in_sets(&[("2018 Humble Bundle", Some("2018-06-01")), ("Jyhad", Some("1994-08-16"))]),
            card_in_sets(&[("Fifth Edition", Some("1999-01-01"))]),
        ];

        let mut canon = SetCanonicalizer::new();
        let sets = collect_unique_sets(&cards, &mut canon);

        let names: Vec<&str> = sets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Fifth Edition", "Promo", "Jyhad"]);

        // First occurrence wins, including its (missing) release date
        assert_eq!(sets[0].release_date.as_deref(), Some("2020-11-30"));
        assert_eq!(sets[1].code, "Promo");
        assert_eq!(sets[1].release_date, None);
        assert_eq!(sets[2].code, "Jyhad");
    }
}
