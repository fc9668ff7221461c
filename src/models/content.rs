//! Saved content model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// The type a piece of saved content is filed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Caption,
    Script,
    Idea,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Caption => "caption",
            ContentType::Script => "script",
            ContentType::Idea => "idea",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "caption" => Some(ContentType::Caption),
            "script" => Some(ContentType::Script),
            "idea" => Some(ContentType::Idea),
            _ => None,
        }
    }

    /// Parse an optional `type` filter; `all` or empty means no filter.
    pub fn parse_filter(s: Option<&str>) -> Result<Option<Self>, AppError> {
        match s.map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(other) => Self::from_str(other)
                .map(Some)
                .ok_or_else(|| AppError::Validation(format!("Unknown content type: {}", other))),
        }
    }
}

/// A generated text saved by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedContent {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub platform: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for saving generated content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveContentRequest {
    pub content: String,
    pub platform: String,
    /// Generation kind the content came from; mapped to a saved type.
    #[serde(default)]
    pub kind: Option<String>,
    /// Explicit saved type, used when `kind` is absent.
    #[serde(default, rename = "type")]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub title: Option<String>,
    /// The prompt the content was generated from; the title falls back to it.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Validated fields ready to be written to the store.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: String,
    pub content: String,
    pub platform: String,
    pub content_type: ContentType,
}
