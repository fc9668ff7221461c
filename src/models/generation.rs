//! Generation request and response bodies.

use serde::{Deserialize, Serialize};

use super::{ContentKind, TrendRecord};

/// Request body for a generation.
///
/// `kind` stays a string so unknown kinds surface as `INVALID_KIND`
/// instead of a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub kind: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub prompt: String,
}

/// Generated text together with what it was generated for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub kind: ContentKind,
    pub platform: String,
    pub prompt: String,
    pub content: String,
}

/// Query parameters for the trending digest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendsQuery {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub focus: Option<String>,
}

/// Parsed trending digest. An empty `trends` list means nothing was found.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsResponse {
    pub platform: String,
    pub trends: Vec<TrendRecord>,
    pub raw: String,
}

/// Whether generation can run, with the warning to show when it cannot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatus {
    pub generation_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
