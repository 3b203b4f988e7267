//! Error types for the card database exporter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Card feed unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Malformed record #{index} ({}): {reason}", name.as_deref().unwrap_or("<unnamed>"))]
    MalformedRecord {
        index: usize,
        name: Option<String>,
        reason: String,
    },

    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("Invalid schema document: {0}")]
    SchemaInvalid(String),

    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unsupported artifact: {0}")]
    UnsupportedArtifact(String),

    #[error("No requested artifact could be written: {0}")]
    OutputFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

impl From<quick_xml::Error> for ExportError {
    fn from(e: quick_xml::Error) -> Self {
        ExportError::InvalidXml(e.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message_names_card() {
        let err = ExportError::MalformedRecord {
            index: 4,
            name: Some("Aabbt Kindred".to_string()),
            reason: "missing field `types`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed record #4 (Aabbt Kindred): missing field `types`"
        );

        let unnamed = ExportError::MalformedRecord {
            index: 0,
            name: None,
            reason: "missing field `name`".to_string(),
        };
        assert!(unnamed.to_string().contains("<unnamed>"));
    }
}
