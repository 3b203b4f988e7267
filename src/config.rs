//! Export run configuration

use crate::export::Compression;
use crate::loader::feed::{KRCG_URL, SCHEMA_URL};
use crate::loader::SourceLocation;
use crate::profile::OutputProfile;
use std::path::{Path, PathBuf};

pub const DEFAULT_AUTHOR: &str = "SchreckNet Authors";

/// Everything the caller decides about one export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub source: SourceLocation,
    pub xml: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub binary: Option<PathBuf>,
    /// Also write a compressed copy of the binary artifact
    pub compression: Option<Compression>,
    pub validate: bool,
    pub schema: SourceLocation,
    pub profile: OutputProfile,
    pub author: String,
    pub pretty_json: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            source: SourceLocation::Url(KRCG_URL.to_string()),
            xml: None,
            json: None,
            binary: None,
            compression: None,
            validate: false,
            schema: SourceLocation::Url(SCHEMA_URL.to_string()),
            profile: OutputProfile::default(),
            author: DEFAULT_AUTHOR.to_string(),
            pretty_json: true,
        }
    }
}

impl ExportConfig {
    pub fn has_outputs(&self) -> bool {
        self.xml.is_some() || self.json.is_some() || self.binary.is_some()
    }

    /// Schema URL advertised in the markup root
    pub fn schema_location(&self) -> String {
        self.schema.to_string()
    }

    /// Path of the compressed binary copy, if one was requested
    pub fn compressed_binary_path(&self) -> Option<PathBuf> {
        let compression = self.compression?;
        let binary = self.binary.as_deref()?;
        Some(with_added_extension(binary, compression.extension()))
    }
}

/// `cards.bin` + `zst` -> `cards.bin.zst`
pub fn with_added_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
