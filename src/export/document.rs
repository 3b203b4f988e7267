//! Logical export document
//!
//! The one tree every encoding serializes. Encoders may differ in layout,
//! never in what survives.

use crate::core::{ExportMetadata, NormalizedCard, SetInfo};
use crate::loader::database::{partition, Partition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDatabaseDocument {
    pub info: ExportMetadata,

    #[serde(default)]
    pub sets: Vec<SetInfo>,

    #[serde(default)]
    pub cards: Vec<NormalizedCard>,

    /// Token section, only filled when tokens are kept apart from cards
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<NormalizedCard>,
}

impl CardDatabaseDocument {
    /// Crypt/library split of cards and tokens
    pub fn partition(&self) -> Partition {
        partition(self.cards.iter().chain(self.tokens.iter()).cloned())
    }

    pub fn card_count(&self) -> usize {
        self.cards.len() + self.tokens.len()
    }
}
