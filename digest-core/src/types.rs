use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Author sentinel for deleted or removed accounts.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Comment body sentinels. Comments carrying these are dropped at
/// extraction, never represented.
pub const DELETED_BODY: &str = "[deleted]";
pub const REMOVED_BODY: &str = "[removed]";

/// Extraction-time caps on text fields. Formatting applies its own,
/// tighter, configurable caps later.
pub const MAX_TITLE_LEN: usize = 300;
pub const MAX_SELFTEXT_LEN: usize = 2000;
pub const MAX_COMMENT_BODY_LEN: usize = 1000;

/// Clip a string to at most `max` characters. Character-based, not
/// byte-based, so multi-byte text never splits mid-codepoint.
pub fn clip_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

/// A normalized Reddit post. Built once at the extraction boundary;
/// downstream code never branches on where the raw record came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: String,
    pub subreddit: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: u64,
    pub created_utc: f64,
    pub created_datetime: DateTime<Utc>,
    pub url: String,
    pub permalink: String,
    pub selftext: String,
    pub is_self: bool,
    pub link_flair_text: String,
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heuristic_score: Option<f64>,
}

/// A normalized comment. Invariant: `body` is never empty and never a
/// deletion sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
}

/// A half-open `[start, end)` UTC interval bounding a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }
}

/// Which fetch strategy produced a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Authenticated,
    Public,
}

impl FetchMode {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, FetchMode::Authenticated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub fetch_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub subreddits: Vec<String>,
    pub total_posts: usize,
    pub authenticated: bool,
}

/// The fetch stage's terminal artifact. Written once, after the full
/// run succeeds; never updated incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchArtifact {
    pub metadata: FetchMetadata,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedMetadata {
    #[serde(flatten)]
    pub fetch: FetchMetadata,
    pub preprocessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingStats {
    pub input_count: usize,
    pub output_count: usize,
    pub filtered_count: usize,
    pub subreddit_medians: BTreeMap<String, f64>,
}

/// The preprocess stage's terminal artifact: the ranked,
/// token-budgeted subset handed to the summarizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedArtifact {
    pub metadata: ProcessedMetadata,
    pub posts: Vec<FormattedPost>,
    pub preprocessing: PreprocessingStats,
}

/// A post narrowed to the fields the summarizer needs. This narrowing
/// is one-way; nothing downstream ever asks for the dropped fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedPost {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    pub author: String,
    pub score: i64,
    pub num_comments: u64,
    pub upvote_ratio: f64,
    pub created_datetime: DateTime<Utc>,
    pub permalink: String,
    pub selftext: String,
    pub heuristic_score: f64,
    pub top_comments: Vec<FormattedComment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedComment {
    pub author: String,
    pub score: i64,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clip_chars_short_text_unchanged() {
        assert_eq!(clip_chars("hello", 10), "hello");
        assert_eq!(clip_chars("hello", 5), "hello");
    }

    #[test]
    fn clip_chars_counts_characters_not_bytes() {
        // Four codepoints, more than four bytes.
        let text = "héllö!";
        assert_eq!(clip_chars(text, 4), "héll");
    }

    #[test]
    fn time_window_is_half_open() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();
        let window = TimeWindow { start, end };

        assert!(window.contains(start));
        assert!(window.contains(start + chrono::Duration::days(3)));
        assert!(!window.contains(end));
        assert!(!window.contains(start - chrono::Duration::seconds(1)));
    }

    #[test]
    fn time_window_duration() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();
        let window = TimeWindow { start, end };
        assert_eq!(window.duration_secs(), 7.0 * 86400.0);
    }
}
