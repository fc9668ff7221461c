//! Content kinds offered by the generator.

use serde::{Deserialize, Serialize};

use super::ContentType;
use crate::errors::AppError;

/// The content category requested by a user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Caption,
    Video,
    Image,
    Trending,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Caption,
        ContentKind::Video,
        ContentKind::Image,
        ContentKind::Trending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Caption => "caption",
            ContentKind::Video => "video",
            ContentKind::Image => "image",
            ContentKind::Trending => "trending",
        }
    }

    /// Parse a kind name, failing with `InvalidKind` for anything unrecognized.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caption" => Ok(ContentKind::Caption),
            "video" => Ok(ContentKind::Video),
            "image" => Ok(ContentKind::Image),
            "trending" => Ok(ContentKind::Trending),
            _ => Err(AppError::InvalidKind(s.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Caption => "Generate Captions",
            ContentKind::Video => "Video Scripts",
            ContentKind::Image => "Image Ideas",
            ContentKind::Trending => "Trending Topics",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ContentKind::Caption => "Create engaging captions for your social media posts",
            ContentKind::Video => "Write compelling scripts for Reels and Shorts",
            ContentKind::Image => "Get creative ideas for your visual content",
            ContentKind::Trending => "Discover what's trending in your niche",
        }
    }

    /// Platforms offered for this kind, first entry is the default.
    pub fn platforms(&self) -> &'static [&'static str] {
        match self {
            ContentKind::Caption => &["instagram", "twitter", "linkedin", "facebook"],
            ContentKind::Video => &["youtube shorts", "instagram reels", "tiktok"],
            ContentKind::Image => &["instagram", "pinterest", "linkedin"],
            ContentKind::Trending => &["all"],
        }
    }

    /// The type a generation of this kind is saved under.
    pub fn saved_type(&self) -> ContentType {
        match self {
            ContentKind::Caption => ContentType::Caption,
            ContentKind::Video => ContentType::Script,
            ContentKind::Image | ContentKind::Trending => ContentType::Idea,
        }
    }

    /// An empty prompt is only acceptable for the trending digest.
    pub fn requires_prompt(&self) -> bool {
        !matches!(self, ContentKind::Trending)
    }
}

/// Public description of a kind, served to clients building their forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindInfo {
    pub kind: ContentKind,
    pub label: &'static str,
    pub description: &'static str,
    pub platforms: &'static [&'static str],
    pub saved_type: ContentType,
}

impl From<ContentKind> for KindInfo {
    fn from(kind: ContentKind) -> Self {
        Self {
            kind,
            label: kind.label(),
            description: kind.description(),
            platforms: kind.platforms(),
            saved_type: kind.saved_type(),
        }
    }
}
