//! Normalization properties
//!
//! Checks the card transform through the public API: crypt/library
//! classification, set canonicalization, group handling, the set/scan
//! join, ruling linking and run-to-run stability.

use similar_asserts::assert_eq;
use wmrh_carddb::loader::card::{link_rulings, normalize_group};
use wmrh_carddb::loader::raw::{OrderedMap, RawPrinting, RawRulings, RawScalar};
use wmrh_carddb::loader::{
    canonicalize, partition, CardNormalizer, RawCard, RawFeed, UNKNOWN_SET_CODE,
};
use wmrh_carddb::profile::OutputProfile;
use wmrh_carddb::ExportError;

fn fixture_feed(name: &str) -> RawFeed {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let bytes = std::fs::read(&path).unwrap();
    RawFeed::parse(&bytes).unwrap()
}

fn raw(name: &str, types: &[&str]) -> RawCard {
    RawCard {
        name: Some(name.to_string()),
        types: Some(types.iter().map(|t| t.to_string()).collect()),
        url: Some(format!("https://static.krcg.org/card/{}.jpg", name.to_lowercase())),
        ..RawCard::default()
    }
}

fn printed(date: &str) -> Vec<RawPrinting> {
    vec![RawPrinting {
        release_date: Some(date.to_string()),
        scan: None,
    }]
}

#[test]
fn test_crypt_types_land_in_crypt() {
    let profile = OutputProfile::wmrh();
    let mut normalizer = CardNormalizer::new(&profile);

    let cards: Vec<_> = [
        raw("Anson", &["Vampire"]),
        raw("Blood Doll", &["Master"]),
        raw("Tom Fuller", &["Imbued"]),
        raw("Deflection", &["Reaction"]),
        raw("Carrion Crows", &["Ally"]),
    ]
    .iter()
    .enumerate()
    .map(|(i, r)| normalizer.normalize(i, r).unwrap())
    .collect();

    let split = partition(cards);
    let crypt: Vec<&str> = split.crypt.iter().map(|c| c.name.as_str()).collect();
    let library: Vec<&str> = split.library.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(crypt, vec!["Anson", "Tom Fuller"]);
    assert_eq!(library, vec!["Blood Doll", "Deflection", "Carrion Crows"]);
    assert!(split.crypt.iter().all(|c| c.is_crypt));
    assert!(split.library.iter().all(|c| !c.is_crypt));
}

#[test]
fn test_canonicalize_examples() {
    assert_eq!(canonicalize("Fifth Edition"), "V5");
    assert_eq!(canonicalize("2015 Storyline Rewards"), "Promo");
    assert_eq!(canonicalize("Promo-20191027"), "Promo");
    assert_eq!(
        canonicalize("Some Brand New Expansion Nobody Mapped"),
        UNKNOWN_SET_CODE
    );
}

#[test]
fn test_group_normalization() {
    assert_eq!(normalize_group(&RawScalar::Text("ANY".to_string())), Ok(0));
    assert_eq!(normalize_group(&RawScalar::Int(3)), Ok(3));

    let profile = OutputProfile::wmrh();
    let mut normalizer = CardNormalizer::new(&profile);
    let card = normalizer.normalize(0, &raw("Anson", &["Vampire"])).unwrap();
    assert_eq!(card.group, None);

    // Absent, not zero and not null
    let json = serde_json::to_value(&card).unwrap();
    assert!(json.get("group").is_none());
}

#[test]
fn test_three_printings_three_scans() {
    let profile = OutputProfile::wmrh();
    let mut normalizer = CardNormalizer::new(&profile);

    let card = RawCard {
        sets: Some(
            [
                ("Jyhad", printed("1994-08-16")),
                ("Camarilla Edition", printed("2002-08-19")),
                ("Fifth Edition", printed("2020-11-30")),
                ("Anthology", printed("2017-05-11")),
            ]
            .into_iter()
            .collect(),
        ),
        scans: Some(
            [
                ("Jyhad", "https://example.org/jyhad.jpg".to_string()),
                ("Camarilla Edition", "https://example.org/ce.jpg".to_string()),
                ("Fifth Edition", "https://example.org/v5.jpg".to_string()),
            ]
            .into_iter()
            .collect(),
        ),
        ..raw("Deflection", &["Reaction"])
    };

    let card = normalizer.normalize(0, &card).unwrap();
    let sets: Vec<(&str, &str)> = card
        .sets
        .iter()
        .map(|s| (s.name.as_str(), s.pic_url.as_str()))
        .collect();
    assert_eq!(
        sets,
        vec![
            ("Jyhad", "https://example.org/jyhad.jpg"),
            ("CE", "https://example.org/ce.jpg"),
            ("V5", "https://example.org/v5.jpg"),
        ]
    );
}

#[test]
fn test_ruling_links_by_substring() {
    let links: OrderedMap<String> = [("X", "https://example.org/x".to_string())]
        .into_iter()
        .collect();
    let rulings = link_rulings(&RawRulings::Grouped {
        text: vec!["See ruling X for details".to_string()],
        links,
    });
    assert_eq!(rulings.len(), 1);
    assert_eq!(rulings[0].references.len(), 1);
    assert_eq!(rulings[0].references[0].label, "X");

    let links: OrderedMap<String> = [("Y", "https://example.org/y".to_string())]
        .into_iter()
        .collect();
    let rulings = link_rulings(&RawRulings::Grouped {
        text: vec!["See ruling X for details".to_string()],
        links,
    });
    assert!(rulings[0].references.is_empty());
}

#[test]
fn test_normalization_is_idempotent() {
    let feed = fixture_feed("mixed_feed.json");
    let profile = OutputProfile::full();

    let first = CardNormalizer::new(&profile).normalize_feed(&feed);
    let second = CardNormalizer::new(&profile).normalize_feed(&feed);

    assert_eq!(
        serde_json::to_string(&first.cards).unwrap(),
        serde_json::to_string(&second.cards).unwrap()
    );
    assert_eq!(first.sets, second.sets);
}

#[test]
fn test_bad_records_are_skipped_and_reported() {
    let feed = fixture_feed("mixed_feed.json");
    let profile = OutputProfile::wmrh();
    let report = CardNormalizer::new(&profile).normalize_feed(&feed);

    let names: Vec<&str> = report.cards.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Aabbt Kindred", "Tom Fuller", "Govern the Unaligned", "Edge Marker"]
    );

    let skipped: Vec<(usize, Option<&str>)> = report
        .skipped
        .iter()
        .map(|e| match e {
            ExportError::MalformedRecord { index, name, .. } => (*index, name.as_deref()),
            other => panic!("Expected malformed record, got {other:?}"),
        })
        .collect();
    assert_eq!(
        skipped,
        vec![
            (3, Some("Nameless Horror")),
            (4, Some("Bad Group")),
            (5, Some("Wrong Shape")),
        ]
    );
}

#[test]
fn test_mixed_feed_details() {
    let feed = fixture_feed("mixed_feed.json");
    let profile = OutputProfile::wmrh();
    let report = CardNormalizer::new(&profile).normalize_feed(&feed);

    let aabbt = &report.cards[0];
    assert_eq!(aabbt.group, Some(0));
    assert_eq!(aabbt.banned.as_deref(), Some("2001-06-01"));
    let codes: Vec<&str> = aabbt.sets.iter().map(|s| s.name.as_str()).collect();
    // The promo printing without a scan is dropped
    assert_eq!(codes, vec!["FN", "Promo"]);

    let tom = &report.cards[1];
    assert!(tom.is_crypt);
    assert_eq!(
        tom.sets[0].pic_url,
        "https://static.krcg.org/card/set/nights-of-reckoning/tomfuller.jpg"
    );

    let govern = &report.cards[2];
    assert_eq!(govern.blood_cost.as_ref().map(|c| c.to_string()).as_deref(), Some("X"));
    assert_eq!(govern.rulings[0].references.len(), 1);
    assert_eq!(govern.sets[1].name, UNKNOWN_SET_CODE);
    assert!(govern.text.is_none());

    assert!(report.cards[3].is_token);

    let set_codes: Vec<&str> = report.sets.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(set_codes, vec!["FN", "Promo", "NoR", "Jyhad", UNKNOWN_SET_CODE]);
    assert_eq!(
        report.unknown_sets,
        vec!["Some Brand New Expansion Nobody Mapped".to_string()]
    );
}

#[test]
fn test_feed_order_survives_parsing() {
    let feed = RawFeed::parse(
        br#"[{
            "name": "Promo Hoarder",
            "types": ["Master"],
            "url": "https://static.krcg.org/card/promohoarder.jpg",
            "sets": {
                "Jyhad": [{"release_date": "1994-08-16"}],
                "Promo-20191027": [{"release_date": "2019-10-27"}],
                "2018 Humble Bundle": [{"release_date": "2018-01-01"}]
            },
            "scans": {
                "Jyhad": "https://example.org/jyhad.jpg",
                "Promo-20191027": "https://example.org/promo.jpg",
                "2018 Humble Bundle": "https://example.org/humble.jpg"
            },
            "rulings": {
                "text": ["Both [Z] and [A] apply."],
                "links": {"[Z]": "https://example.org/z", "[A]": "https://example.org/a"}
            }
        }]"#,
    )
    .unwrap();

    let report = CardNormalizer::new(&OutputProfile::wmrh()).normalize_feed(&feed);
    let card = &report.cards[0];

    let pics: Vec<(&str, &str)> = card
        .sets
        .iter()
        .map(|s| (s.name.as_str(), s.pic_url.as_str()))
        .collect();
    assert_eq!(
        pics,
        vec![
            ("Jyhad", "https://example.org/jyhad.jpg"),
            ("Promo", "https://example.org/promo.jpg"),
            ("Promo", "https://example.org/humble.jpg"),
        ]
    );

    let labels: Vec<&str> = card.rulings[0]
        .references
        .iter()
        .map(|r| r.label.as_str())
        .collect();
    assert_eq!(labels, vec!["[Z]", "[A]"]);

    // The promo bucket takes the first-seen printing's date
    let sets: Vec<(&str, Option<&str>)> = report
        .sets
        .iter()
        .map(|s| (s.name.as_str(), s.release_date.as_deref()))
        .collect();
    assert_eq!(
        sets,
        vec![("Jyhad", Some("1994-08-16")), ("Promo", Some("2019-10-27"))]
    );
}
