//! Compact binary card database
//!
//! MessagePack with named fields, so optional fields can be skipped
//! without breaking decoding. The compressed variant is a plain gzip or
//! zstd stream over the same bytes.

use super::{CardDatabaseDocument, Emitter};
use crate::{ExportError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

const ZSTD_LEVEL: i32 = 19;

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryEmitter;

impl Emitter for BinaryEmitter {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn emit(&self, doc: &CardDatabaseDocument) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(doc).map_err(|e| ExportError::SerializationError(e.to_string()))
    }
}

pub fn from_binary(bytes: &[u8]) -> Result<CardDatabaseDocument> {
    rmp_serde::from_slice(bytes).map_err(|e| ExportError::SerializationError(e.to_string()))
}

/// Byte-stream compression applied to the binary artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
}

impl Compression {
    /// File extension appended to the uncompressed artifact's path
    pub fn extension(self) -> &'static str {
        match self {
            Compression::Gzip => "gz",
            Compression::Zstd => "zst",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "gz" => Some(Compression::Gzip),
            "zst" => Some(Compression::Zstd),
            _ => None,
        }
    }

    pub fn compress(self, bytes: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::best());
                encoder.write_all(bytes)?;
                Ok(encoder.finish()?)
            }
            Compression::Zstd => Ok(zstd::encode_all(bytes, ZSTD_LEVEL)?),
        }
    }

    pub fn decompress(self, bytes: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::Gzip => {
                let mut out = Vec::new();
                GzDecoder::new(bytes).read_to_end(&mut out)?;
                Ok(out)
            }
            Compression::Zstd => Ok(zstd::decode_all(bytes)?),
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            _ => Err(format!("unknown compression '{s}' (expected: gzip, zstd)")),
        }
    }
}
