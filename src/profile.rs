//! Output profiles
//!
//! A profile decides which optional card fields survive normalization,
//! how tokens are exported and which format version is stamped on the
//! document. Every emitter sees the same profiled records.

use crate::core::NormalizedCard;

/// Format version stamped by the default profile
pub const WMRH_FORMAT_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputProfile {
    /// Profile name, for logging
    pub name: String,
    pub include_printed_name: bool,
    pub include_url: bool,
    pub include_banned: bool,
    pub include_text: bool,
    pub include_rulings: bool,
    /// Export token cards (feed tokens and the built-in status markers)
    pub include_tokens: bool,
    /// Put tokens in their own document section instead of the card list
    pub separate_tokens: bool,
    pub format_version: String,
}

impl OutputProfile {
    /// Profile matching the WMRH card database consumer
    pub fn wmrh() -> Self {
        OutputProfile {
            name: "wmrh".to_string(),
            include_printed_name: true,
            include_url: true,
            include_banned: true,
            include_text: false,
            include_rulings: true,
            include_tokens: true,
            separate_tokens: false,
            format_version: WMRH_FORMAT_VERSION.to_string(),
        }
    }

    /// Every field the feed offers, tokens in their own section
    pub fn full() -> Self {
        OutputProfile {
            name: "full".to_string(),
            include_text: true,
            separate_tokens: true,
            ..Self::wmrh()
        }
    }

    pub fn with_tokens(mut self, include: bool) -> Self {
        self.include_tokens = include;
        self
    }

    pub fn with_separate_tokens(mut self, separate: bool) -> Self {
        self.separate_tokens = separate;
        self
    }

    pub fn with_format_version(mut self, version: impl Into<String>) -> Self {
        self.format_version = version.into();
        self
    }

    /// Drop the optional fields this profile excludes
    pub fn strip(&self, mut card: NormalizedCard) -> NormalizedCard {
        if !self.include_printed_name {
            card.printed_name = None;
        }
        if !self.include_url {
            card.url = None;
        }
        if !self.include_banned {
            card.banned = None;
        }
        if !self.include_text {
            card.text = None;
        }
        if !self.include_rulings {
            card.rulings.clear();
        }
        card
    }
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self::wmrh()
    }
}

impl std::str::FromStr for OutputProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wmrh" => Ok(Self::wmrh()),
            "full" => Ok(Self::full()),
            _ => Err(format!("unknown profile '{s}' (expected: wmrh, full)")),
        }
    }
}
