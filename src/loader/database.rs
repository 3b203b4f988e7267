//! Normalized card database
//!
//! Holds one run's normalized cards, tokens and set list, and splits the
//! cards into crypt and library.

use crate::core::{ExportMetadata, NormalizedCard, SetInfo};
use crate::export::CardDatabaseDocument;
use crate::loader::card::{CardNormalizer, NormalizeReport};
use crate::loader::raw::RawFeed;
use crate::loader::tokens::builtin_tokens;
use crate::profile::OutputProfile;
use tracing::info;

/// Crypt and library halves of a card collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub crypt: Vec<NormalizedCard>,
    pub library: Vec<NormalizedCard>,
}

/// Stable partition on `is_crypt`
///
/// Every card lands in exactly one half; order within each half is the
/// input order.
pub fn partition(cards: impl IntoIterator<Item = NormalizedCard>) -> Partition {
    let (crypt, library) = cards.into_iter().partition(|card| card.is_crypt);
    Partition { crypt, library }
}

/// Database of normalized cards for a single export run
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: Vec<NormalizedCard>,
    sets: Vec<SetInfo>,
}

impl CardDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        CardDatabase::default()
    }

    /// Normalize a feed snapshot into a database
    ///
    /// Built-in tokens are appended after the feed's cards when the profile
    /// includes tokens. The report lists skipped records and unknown sets.
    pub fn build(feed: &RawFeed, profile: &OutputProfile) -> (Self, NormalizeReport) {
        let mut report = CardNormalizer::new(profile).normalize_feed(feed);

        let mut db = CardDatabase {
            cards: std::mem::take(&mut report.cards),
            sets: report.sets.clone(),
        };
        if profile.include_tokens {
            for token in builtin_tokens(profile) {
                db.add_card(token);
            }
        }

        info!(
            cards = db.len(),
            sets = db.sets.len(),
            skipped = report.skipped.len(),
            "normalized card feed"
        );
        (db, report)
    }

    /// Add a single card to the database
    pub fn add_card(&mut self, card: NormalizedCard) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[NormalizedCard] {
        &self.cards
    }

    pub fn sets(&self) -> &[SetInfo] {
        &self.sets
    }

    /// Non-token cards, in feed order
    pub fn real_cards(&self) -> impl Iterator<Item = &NormalizedCard> {
        self.cards.iter().filter(|card| !card.is_token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &NormalizedCard> {
        self.cards.iter().filter(|card| card.is_token)
    }

    /// Crypt/library split of every card, tokens included
    pub fn partition(&self) -> Partition {
        partition(self.cards.iter().cloned())
    }

    /// Total number of cards in database
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Assemble the logical document every emitter serializes
    pub fn to_document(&self, info: ExportMetadata, profile: &OutputProfile) -> CardDatabaseDocument {
        let (cards, tokens) = if profile.separate_tokens {
            (
                self.real_cards().cloned().collect(),
                self.tokens().cloned().collect(),
            )
        } else {
            (self.cards.clone(), Vec::new())
        };

        CardDatabaseDocument {
            info,
            sets: self.sets.clone(),
            cards,
            tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NameList;
    use crate::loader::raw::RawCard;

    fn card(name: &str, card_type: &str) -> NormalizedCard {
        let mut types = NameList::new();
        types.push(card_type.to_string());
        NormalizedCard::new(name, types)
    }

    fn raw(name: &str, card_type: &str) -> RawCard {
        RawCard {
            name: Some(name.to_string()),
            types: Some(vec![card_type.to_string()]),
            url: Some(format!("https://example.org/{name}")),
            ..RawCard::default()
        }
    }

    #[test]
    fn test_empty_database() {
        let db = CardDatabase::new();
        assert_eq!(db.len(), 0);
        assert!(db.is_empty());
    }

    #[test]
    fn test_partition_is_stable_and_total() {
        let cards = vec![
            card("Anson", "Vampire"),
            card("Blood Doll", "Master"),
            card("Tom Fuller", "Imbued"),
            card("Deflection", "Reaction"),
            card("Beckett", "Vampire"),
        ];

        let split = partition(cards);
        let crypt: Vec<&str> = split.crypt.iter().map(|c| c.name.as_str()).collect();
        let library: Vec<&str> = split.library.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(crypt, vec!["Anson", "Tom Fuller", "Beckett"]);
        assert_eq!(library, vec!["Blood Doll", "Deflection"]);
    }

    #[test]
    fn test_build_appends_tokens() {
        let feed = RawFeed::from_cards(vec![raw("Anson", "Vampire"), raw("Blood Doll", "Master")]);

        let (db, report) = CardDatabase::build(&feed, &OutputProfile::wmrh());
        assert!(report.skipped.is_empty());
        assert_eq!(db.real_cards().count(), 2);
        assert_eq!(db.tokens().count(), 3);
        assert!(db.tokens().any(|t| t.name == "The Edge"));
        // Tokens go through the same field filter as feed cards
        assert!(db.cards().iter().all(|c| c.text.is_none()));

        let (db, _) = CardDatabase::build(&feed, &OutputProfile::wmrh().with_tokens(false));
        assert_eq!(db.tokens().count(), 0);
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_document_separates_tokens_on_request() {
        let feed = RawFeed::from_cards(vec![raw("Anson", "Vampire")]);
        let meta = ExportMetadata::now("tester", "feed.json", "1");

        let profile = OutputProfile::wmrh();
        let (db, _) = CardDatabase::build(&feed, &profile);
        let doc = db.to_document(meta.clone(), &profile);
        assert_eq!(doc.cards.len(), 4);
        assert!(doc.tokens.is_empty());

        let profile = OutputProfile::wmrh().with_separate_tokens(true);
        let doc = db.to_document(meta, &profile);
        assert_eq!(doc.cards.len(), 1);
        assert_eq!(doc.tokens.len(), 3);
    }
}
