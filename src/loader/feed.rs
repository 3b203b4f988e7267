//! Feed and schema retrieval
//!
//! Both the card feed and the XML schema are single read-only documents,
//! fetched over HTTP or read from a local file and fully buffered.

use crate::loader::raw::RawFeed;
use crate::{ExportError, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Default card feed
pub const KRCG_URL: &str = "https://static.krcg.org/data/vtes.json";

/// Default schema for the markup export
pub const SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/Stolas/SchreckNet-WMRH-CardDB/master/cards.xsd";

/// Where a document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

impl SourceLocation {
    /// `http://` and `https://` locations are URLs, anything else a path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            SourceLocation::Url(location.to_string())
        } else {
            SourceLocation::File(PathBuf::from(location))
        }
    }

    /// Fetch the whole document
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            SourceLocation::Url(url) => {
                let resp = reqwest::get(url).await?.error_for_status()?;
                Ok(resp.bytes().await?.to_vec())
            }
            SourceLocation::File(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Url(url) => f.write_str(url),
            SourceLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl std::str::FromStr for SourceLocation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("location must not be empty".to_string());
        }
        Ok(SourceLocation::parse(s))
    }
}

/// Fetch and parse the card feed
///
/// Any failure here is fatal for the run and surfaces as
/// [`ExportError::SourceUnavailable`].
pub async fn load_feed(source: &SourceLocation) -> Result<RawFeed> {
    info!(%source, "fetching card feed");
    let bytes = source
        .fetch()
        .await
        .map_err(|e| ExportError::SourceUnavailable(format!("{source}: {e}")))?;

    let feed = RawFeed::parse(&bytes)?;
    info!(records = feed.len(), "card feed loaded");
    Ok(feed)
}

/// Fetch the schema document
///
/// Failures surface as [`ExportError::SchemaUnavailable`] so callers can
/// skip validation instead of aborting.
pub async fn fetch_schema(location: &SourceLocation) -> Result<Vec<u8>> {
    location
        .fetch()
        .await
        .map_err(|e| ExportError::SchemaUnavailable(format!("{location}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        assert_eq!(
            SourceLocation::parse(KRCG_URL),
            SourceLocation::Url(KRCG_URL.to_string())
        );
        assert_eq!(
            SourceLocation::parse("data/vtes.json"),
            SourceLocation::File(PathBuf::from("data/vtes.json"))
        );
        assert_eq!(SourceLocation::parse("data/vtes.json").to_string(), "data/vtes.json");
    }

    #[tokio::test]
    async fn test_missing_feed_is_source_unavailable() {
        let source = SourceLocation::File(PathBuf::from("does/not/exist/vtes.json"));
        let err = load_feed(&source).await.unwrap_err();
        assert!(matches!(err, ExportError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_schema_is_schema_unavailable() {
        let location = SourceLocation::File(PathBuf::from("does/not/exist/cards.xsd"));
        let err = fetch_schema(&location).await.unwrap_err();
        assert!(matches!(err, ExportError::SchemaUnavailable(_)));
    }
}
