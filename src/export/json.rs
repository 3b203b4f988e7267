//! JSON card database

use super::{CardDatabaseDocument, Emitter};
use crate::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter {
    pub pretty: bool,
}

impl JsonEmitter {
    pub fn new(pretty: bool) -> Self {
        JsonEmitter { pretty }
    }
}

impl Emitter for JsonEmitter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn emit(&self, doc: &CardDatabaseDocument) -> Result<Vec<u8>> {
        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(doc)?
        } else {
            serde_json::to_vec(doc)?
        };
        bytes.push(b'\n');
        Ok(bytes)
    }
}

pub fn from_json(bytes: &[u8]) -> Result<CardDatabaseDocument> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExportMetadata, NormalizedCard};
    use smallvec::smallvec;

    fn document() -> CardDatabaseDocument {
        let mut card = NormalizedCard::new("Anson", smallvec!["Vampire".to_string()]);
        card.group = Some(1);
        CardDatabaseDocument {
            info: ExportMetadata::now("tester", "feed.json", "1"),
            sets: Vec::new(),
            cards: vec![card],
            tokens: Vec::new(),
        }
    }

    #[test]
    fn test_field_names() {
        let bytes = JsonEmitter::new(false).emit(&document()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert!(value["info"]["createdAt"].is_string());
        assert_eq!(value["info"]["version"], "1");
        assert_eq!(value["cards"][0]["group"], 1);
        assert!(value["cards"][0].get("capacity").is_none());
        assert!(value.get("tokens").is_none());
    }

    #[test]
    fn test_pretty_and_compact_decode_alike() {
        let doc = document();
        let pretty = JsonEmitter::new(true).emit(&doc).unwrap();
        let compact = JsonEmitter::new(false).emit(&doc).unwrap();

        assert!(pretty.len() > compact.len());
        assert_eq!(from_json(&pretty).unwrap(), doc);
        assert_eq!(from_json(&compact).unwrap(), doc);
    }
}
