//! Export encodings
//!
//! Every emitter serializes the same [`CardDatabaseDocument`]; decoders
//! read each encoding back into that document.

pub mod binary;
pub mod document;
pub mod json;
pub mod markup;
pub mod validate;
pub mod xml_tree;

pub use binary::{BinaryEmitter, Compression};
pub use document::CardDatabaseDocument;
pub use json::JsonEmitter;
pub use markup::MarkupEmitter;
pub use validate::{SchemaViolation, XsdSchema};

use crate::{ExportError, Result};
use std::path::Path;

/// Serializer for one output encoding
pub trait Emitter {
    /// Short encoding name, for logs and summaries
    fn name(&self) -> &'static str;

    fn emit(&self, doc: &CardDatabaseDocument) -> Result<Vec<u8>>;
}

/// Encoding of an artifact on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Xml,
    Json,
    Binary,
}

impl ArtifactFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "xml" => Some(ArtifactFormat::Xml),
            "json" => Some(ArtifactFormat::Json),
            "msgpack" | "mpk" | "bin" => Some(ArtifactFormat::Binary),
            _ => None,
        }
    }

    /// Detect format and compression from a file name
    ///
    /// `cards.bin.zst` is zstd-compressed binary, `cards.xml` plain markup.
    pub fn detect(path: &Path) -> Result<(Self, Option<Compression>)> {
        let unsupported = || ExportError::UnsupportedArtifact(path.display().to_string());
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(unsupported)?;

        if let Some(compression) = Compression::from_extension(&ext) {
            let inner = path
                .file_stem()
                .map(Path::new)
                .and_then(|stem| stem.extension())
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .ok_or_else(unsupported)?;
            let format = Self::from_extension(&inner).ok_or_else(unsupported)?;
            return Ok((format, Some(compression)));
        }

        Self::from_extension(&ext)
            .map(|format| (format, None))
            .ok_or_else(unsupported)
    }

    pub fn decode(self, bytes: &[u8]) -> Result<CardDatabaseDocument> {
        match self {
            ArtifactFormat::Xml => markup::from_xml(bytes),
            ArtifactFormat::Json => json::from_json(bytes),
            ArtifactFormat::Binary => binary::from_binary(bytes),
        }
    }
}

/// Decode artifact bytes given the artifact's file name
pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<CardDatabaseDocument> {
    let (format, compression) = ArtifactFormat::detect(path)?;
    match compression {
        Some(compression) => format.decode(&compression.decompress(bytes)?),
        None => format.decode(bytes),
    }
}

/// Read and decode any artifact this crate writes
pub async fn decode_artifact(path: &Path) -> Result<CardDatabaseDocument> {
    let bytes = tokio::fs::read(path).await?;
    decode_bytes(path, &bytes)
}
