//! Set list entries

use serde::{Deserialize, Serialize};

/// A set (print run) known to the export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    /// Canonical short code (e.g., "V5"), or the unknown-set sentinel
    pub code: String,

    /// Full set name after promo bucketing (e.g., "Fifth Edition", "Promo")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}
