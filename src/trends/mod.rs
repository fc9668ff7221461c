//! Trending digest parser.
//!
//! Turns the free-text answer to a trending prompt into [`TrendRecord`]s.
//! The response format is whatever the model chose to write, so parsing is
//! best effort: it never fails, and missing pieces default to empty.
//!
//! Each block starts at a bold `**Trend N:` heading. Inside a block a small
//! state machine walks the lines with a [`Cursor`] naming the field that
//! labelled lines most recently switched to.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::TrendRecord;

static TREND_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*Trend \d+:").expect("trend header pattern is valid")
});

const BULLET_PREFIX: &str = "- ";

/// Field a block's lines are currently attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// No labelled line seen yet.
    Start,
    Description,
    Why,
    Leverage,
    Hashtags,
    Ideas,
}

/// Labels recognized inside a block, checked in order.
const MARKERS: [(Cursor, &str); 5] = [
    (Cursor::Description, "Trend description:"),
    (Cursor::Why, "Why it's trending:"),
    (Cursor::Leverage, "How to leverage it:"),
    (Cursor::Hashtags, "Popular hashtags:"),
    (Cursor::Ideas, "Content ideas:"),
];

/// What a single trimmed line means to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A labelled line; `rest` is the line with the label removed.
    Marker { field: Cursor, rest: String },
    /// A `- ` bullet, prefix stripped.
    Bullet(String),
    /// Anything else.
    Text,
}

/// Classify one trimmed line.
pub fn classify(line: &str) -> LineEvent {
    for (field, label) in MARKERS {
        let bold = format!("**{}**", label);
        let marker = if line.contains(&bold) {
            bold
        } else if line.contains(label) {
            label.to_string()
        } else {
            continue;
        };
        let rest = line.replacen(&marker, "", 1).trim().to_string();
        return LineEvent::Marker { field, rest };
    }

    match line.strip_prefix(BULLET_PREFIX) {
        Some(item) => LineEvent::Bullet(item.to_string()),
        None => LineEvent::Text,
    }
}

impl Cursor {
    /// Cursor after `event`. Only labelled lines move it.
    pub fn transition(self, event: &LineEvent) -> Cursor {
        match event {
            LineEvent::Marker { field, .. } => *field,
            LineEvent::Bullet(_) | LineEvent::Text => self,
        }
    }
}

/// Split a hashtag line into tags, dropping non-`#` tokens and the leading `#`.
///
/// A bare `#` becomes an empty tag.
pub fn parse_hashtags(rest: &str) -> Vec<String> {
    rest.split_whitespace()
        .filter_map(|token| token.strip_prefix('#'))
        .map(str::to_string)
        .collect()
}

fn strip_bold(title: &str) -> String {
    title.replace("**", "").trim().to_string()
}

/// Parse one block of text following a `**Trend N:` heading.
///
/// Returns `None` when the block has no non-empty lines.
pub fn parse_block(block: &str) -> Option<TrendRecord> {
    let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());

    let mut record = TrendRecord {
        title: strip_bold(lines.next()?),
        ..TrendRecord::default()
    };

    let mut cursor = Cursor::Start;
    for line in lines {
        let event = classify(line);
        cursor = cursor.transition(&event);

        match event {
            LineEvent::Marker { field, rest } => match field {
                Cursor::Description => record.description = rest,
                Cursor::Why => record.why = rest,
                Cursor::Leverage => record.leverage = rest,
                Cursor::Hashtags => record.hashtags = parse_hashtags(&rest),
                // Ideas come from the bullets that follow.
                Cursor::Ideas | Cursor::Start => {}
            },
            LineEvent::Bullet(item) if cursor == Cursor::Ideas => record.ideas.push(item),
            // Continuation lines of description/why/leverage are dropped.
            LineEvent::Bullet(_) | LineEvent::Text => {}
        }
    }

    Some(record)
}

/// Parse a whole trending digest into records, in source order.
///
/// Text before the first heading is ignored; text without any heading
/// yields no records.
pub fn parse_trends(text: &str) -> Vec<TrendRecord> {
    let mut fragments = TREND_HEADER.split(text);
    // Everything before the first heading, or the whole text if none matched.
    fragments.next();

    let trends: Vec<TrendRecord> = fragments.filter_map(parse_block).collect();
    tracing::debug!("Parsed {} trends from digest", trends.len());
    trends
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BLOCKS: &str = "Here are today's trends.

**Trend 1: Cozy Cardio**
**Trend description:** Low-intensity workouts at home.
**Why it's trending:** People want gentle routines.
**How to leverage it:** Share your own cozy setup.
**Popular hashtags:** #a #b
**Content ideas:**
- Film a morning walk-pad session
- Rate your favourite cozy playlists

**Trend 2: Silent Vlogs**
";

    #[test]
    fn test_two_block_digest() {
        let trends = parse_trends(TWO_BLOCKS);
        assert_eq!(trends.len(), 2);

        let first = &trends[0];
        assert_eq!(first.title, "Cozy Cardio");
        assert_eq!(first.description, "Low-intensity workouts at home.");
        assert_eq!(first.why, "People want gentle routines.");
        assert_eq!(first.leverage, "Share your own cozy setup.");
        assert_eq!(first.hashtags, vec!["a", "b"]);
        assert_eq!(first.ideas.len(), 2);
        assert_eq!(first.ideas[0], "Film a morning walk-pad session");

        let second = &trends[1];
        assert_eq!(
            second,
            &TrendRecord {
                title: "Silent Vlogs".to_string(),
                ..TrendRecord::default()
            }
        );
    }

    #[test]
    fn test_bare_hash_becomes_empty_tag() {
        let trends = parse_trends("**Trend 1: X**\n**Popular hashtags:** #");
        assert_eq!(trends[0].hashtags, vec![String::new()]);
    }

    #[test]
    fn test_hashtag_line_without_tags_is_empty() {
        let trends = parse_trends("**Trend 1: X**\n**Popular hashtags:** none today, sorry");
        assert!(trends[0].hashtags.is_empty());
    }

    #[test]
    fn test_no_headings_yields_no_records() {
        assert!(parse_trends("").is_empty());
        assert!(parse_trends("Trends are everywhere. The trend of the week is trend 1.").is_empty());
    }

    #[test]
    fn test_plain_trend_word_does_not_split() {
        let text = "**Trend 1: Alpha**\n**Trend description:** A trend about the Trend 2 idea.";
        let trends = parse_trends(text);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].description, "A trend about the Trend 2 idea.");
    }

    #[test]
    fn test_bullets_before_ideas_are_ignored() {
        let text = "**Trend 1: Alpha**
**Trend description:** Something
- not an idea
**Popular hashtags:** #x
- still not an idea
**Content ideas:**
- real idea";
        let trends = parse_trends(text);
        assert_eq!(trends[0].ideas, vec!["real idea"]);
        assert_eq!(trends[0].hashtags, vec!["x"]);
    }

    #[test]
    fn test_continuation_lines_are_dropped() {
        let text = "**Trend 1: Alpha**
**Why it's trending:** First line.
Second line that is lost.";
        let trends = parse_trends(text);
        assert_eq!(trends[0].why, "First line.");
    }

    #[test]
    fn test_unlabelled_block_keeps_title_only() {
        let trends = parse_trends("**Trend 3:** **Retro Filters**\nsome chatter\n- stray bullet");
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].title, "Retro Filters");
        assert!(trends[0].ideas.is_empty());
        assert!(trends[0].description.is_empty());
    }

    #[test]
    fn test_empty_fragments_are_discarded() {
        let trends = parse_trends("**Trend 1: One**\n\n**Trend 2:\n   \n");
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].title, "One");
    }

    #[test]
    fn test_classify_transitions() {
        assert_eq!(
            classify("**Trend description:** hello"),
            LineEvent::Marker {
                field: Cursor::Description,
                rest: "hello".to_string()
            }
        );
        assert_eq!(
            classify("Content ideas:"),
            LineEvent::Marker {
                field: Cursor::Ideas,
                rest: String::new()
            }
        );
        assert_eq!(classify("- idea"), LineEvent::Bullet("idea".to_string()));
        assert_eq!(classify("-idea"), LineEvent::Text);

        let bullet = LineEvent::Bullet("x".into());
        assert_eq!(Cursor::Start.transition(&bullet), Cursor::Start);
        assert_eq!(Cursor::Ideas.transition(&bullet), Cursor::Ideas);
        assert_eq!(Cursor::Ideas.transition(&LineEvent::Text), Cursor::Ideas);
        let why = classify("**Why it's trending:** because");
        assert_eq!(Cursor::Ideas.transition(&why), Cursor::Why);
    }

    #[test]
    fn test_parse_hashtags_keeps_only_hash_tokens() {
        assert_eq!(parse_hashtags("#one two #three"), vec!["one", "three"]);
        assert_eq!(parse_hashtags("##double"), vec!["#double"]);
        assert!(parse_hashtags("").is_empty());
    }

    #[test]
    fn test_parse_hashtags_splits_on_any_whitespace() {
        assert_eq!(parse_hashtags("#a  #b\t#c"), vec!["a", "b", "c"]);
        assert_eq!(parse_hashtags("# #x"), vec!["", "x"]);
    }
}
