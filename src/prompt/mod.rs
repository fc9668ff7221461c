//! Instruction templates for the generation API.
//!
//! One fixed template per content kind, with the platform and the user's
//! prompt substituted in. Building is pure and deterministic.

use crate::errors::AppError;
use crate::models::ContentKind;

/// Topic substituted when a trending digest is requested without a focus.
pub const DEFAULT_TREND_FOCUS: &str = "general trends";

/// Build the instruction for a kind.
///
/// Kinds arrive as names on the wire; [`ContentKind::parse`] rejects unknown
/// ones before a template is picked.
pub fn build(kind: ContentKind, platform: &str, prompt: &str) -> Result<String, AppError> {
    let prompt = prompt.trim();
    if prompt.is_empty() && kind.requires_prompt() {
        return Err(AppError::EmptyPrompt);
    }

    let text = match kind {
        ContentKind::Caption => format!(
            "Generate an engaging social media caption for {platform} with the following context: {prompt}.
Format the response with:
- An attention-grabbing opening line
- Main content (2-3 sentences)
- Call to action
- 5-7 relevant hashtags

Make it sound natural and conversational, not overly promotional."
        ),
        ContentKind::Video => format!(
            "Create a compelling {platform} video script outline for the following topic: {prompt}.
Format the response with:
- Hook (5-7 seconds)
- Main content structure (30-45 seconds)
- Call to action (5-7 seconds)
- Include timing suggestions
- Add engagement tips

Keep it concise and engaging."
        ),
        ContentKind::Image => format!(
            "Generate creative image ideas for {platform} content with the following theme: {prompt}.
For each idea include:
- Visual concept description
- Composition suggestions
- Color palette recommendations
- Props or elements to include
- Caption suggestions
Provide 3 different creative concepts."
        ),
        ContentKind::Trending => {
            let focus = if prompt.is_empty() {
                DEFAULT_TREND_FOCUS
            } else {
                prompt
            };
            format!(
                "Generate a list of current trending topics and content ideas for {platform} with focus on: {focus}.
Start each topic with a bold heading of the form **Trend N: <title>**.
Include for each trend, each on its own line with a bold label:
- **Trend description:**
- **Why it's trending:**
- **How to leverage it:**
- **Popular hashtags:** (space-separated, each starting with #)
- **Content ideas:** (followed by one idea per line, each starting with \"- \")
List 3-5 trending topics."
            )
        }
    };

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_deterministic() {
        for kind in ContentKind::ALL {
            let a = build(kind, "instagram", "coffee shop launch").unwrap();
            let b = build(kind, "instagram", "coffee shop launch").unwrap();
            assert_eq!(a, b);
            assert!(a.contains("instagram"));
            assert!(a.contains("coffee shop launch"));
        }
    }

    #[test]
    fn test_trending_allows_empty_prompt() {
        let text = build(ContentKind::Trending, "all", "").unwrap();
        assert!(text.contains("with focus on: general trends."));

        let text = build(ContentKind::Trending, "all", "   ").unwrap();
        assert!(text.contains(DEFAULT_TREND_FOCUS));
    }

    #[test]
    fn test_other_kinds_reject_empty_prompt() {
        for kind in [ContentKind::Caption, ContentKind::Video, ContentKind::Image] {
            assert!(matches!(
                build(kind, "instagram", ""),
                Err(AppError::EmptyPrompt)
            ));
            assert!(matches!(
                build(kind, "instagram", " \n\t"),
                Err(AppError::EmptyPrompt)
            ));
        }
    }

    #[test]
    fn test_unknown_kind_never_reaches_a_template() {
        assert!(matches!(
            ContentKind::parse("podcast").and_then(|kind| build(kind, "spotify", "anything")),
            Err(AppError::InvalidKind(_))
        ));
    }

    #[test]
    fn test_templates_differ_per_kind() {
        let caption = build(ContentKind::Caption, "twitter", "x").unwrap();
        let video = build(ContentKind::Video, "twitter", "x").unwrap();
        let image = build(ContentKind::Image, "twitter", "x").unwrap();
        assert!(caption.starts_with("Generate an engaging social media caption"));
        assert!(video.starts_with("Create a compelling twitter video script"));
        assert!(image.contains("Provide 3 different creative concepts."));
    }

    #[test]
    fn test_trending_template_names_parser_markers() {
        let text = build(ContentKind::Trending, "tiktok", "fitness").unwrap();
        for marker in [
            "**Trend N:",
            "**Trend description:**",
            "**Why it's trending:**",
            "**How to leverage it:**",
            "**Popular hashtags:**",
            "**Content ideas:**",
        ] {
            assert!(text.contains(marker), "missing {marker}");
        }
    }
}
