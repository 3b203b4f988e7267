//! Export metadata header

use serde::{Deserialize, Serialize};

/// Timestamp layout of the `createdAt` header field
pub const CREATED_AT_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

/// Run-level header stamped on every export
///
/// This is the only place a timestamp enters the output; the per-card
/// transform is time independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub author: String,

    #[serde(rename = "createdAt")]
    pub created_at: String,

    #[serde(rename = "sourceUrl")]
    pub source_url: String,

    /// Format-version tag of the output document
    #[serde(rename = "version")]
    pub format_version: String,
}

impl ExportMetadata {
    /// Header stamped with the current local time
    pub fn now(
        author: impl Into<String>,
        source_url: impl Into<String>,
        format_version: impl Into<String>,
    ) -> Self {
        ExportMetadata {
            author: author.into(),
            created_at: chrono::Local::now().format(CREATED_AT_FORMAT).to_string(),
            source_url: source_url.into(),
            format_version: format_version.into(),
        }
    }
}
