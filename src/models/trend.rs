//! Structured trend card produced from a trending digest.

use serde::{Deserialize, Serialize};

/// One trend parsed out of a trending-digest response.
///
/// `hashtags` and `ideas` are always present, possibly empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendRecord {
    pub title: String,
    pub description: String,
    pub why: String,
    pub leverage: String,
    pub hashtags: Vec<String>,
    pub ideas: Vec<String>,
}
