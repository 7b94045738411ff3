use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_SUBREDDITS: &[&str] = &["MachineLearning", "LocalLLaMA", "ChatGPT", "OpenAI"];

/// Weight sums further than this from 1.0 draw an advisory warning.
const WEIGHT_SUM_TOLERANCE: f64 = 0.05;

/// Raw on-disk configuration shape. Every field is optional; defaults
/// are resolved exactly once, in [`AppConfig::resolve`], so the rest
/// of the pipeline never falls back at the use site.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub reddit: Option<RawRedditSection>,
    pub fetch: Option<RawFetchSection>,
    pub time_window: Option<RawTimeWindowSection>,
    pub scoring: Option<RawScoringSection>,
    pub content_thresholds: Option<RawContentThresholds>,
    pub content_scores: Option<RawContentScores>,
    pub formatting: Option<RawFormattingSection>,
    pub subreddits: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawRedditSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFetchSection {
    pub max_posts_per_subreddit: Option<usize>,
    pub max_comments_per_post: Option<usize>,
    pub min_score: Option<i64>,
    pub rate_limit_delay: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTimeWindowSection {
    pub start: Option<String>,
    pub end: Option<String>,
    pub default_days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawScoringSection {
    pub engagement_weight: Option<f64>,
    pub comments_weight: Option<f64>,
    pub recency_weight: Option<f64>,
    pub content_weight: Option<f64>,
    pub ratio_weight: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawContentThresholds {
    pub very_short: Option<usize>,
    pub brief: Option<usize>,
    pub good: Option<usize>,
    pub substantial: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawContentScores {
    pub very_short: Option<f64>,
    pub brief: Option<f64>,
    pub good: Option<f64>,
    pub substantial: Option<f64>,
    pub wall_of_text: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFormattingSection {
    pub max_selftext_length: Option<usize>,
    pub max_comment_body_length: Option<usize>,
    pub max_top_comments: Option<usize>,
}

/// Fully-resolved configuration. Every field holds a concrete value.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reddit: RedditCredentials,
    pub fetch: FetchSettings,
    pub time_window: TimeWindowSettings,
    pub scoring: ScoreWeights,
    pub content: ContentRubric,
    pub formatting: FormattingLimits,
    pub subreddits: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    /// Credentials are present only when both halves are non-blank.
    pub fn is_present(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub max_posts_per_subreddit: usize,
    pub max_comments_per_post: usize,
    pub min_score: i64,
    pub rate_limit_delay_secs: u64,
}

#[derive(Debug, Clone)]
pub struct TimeWindowSettings {
    pub start: Option<String>,
    pub end: Option<String>,
    pub default_days: i64,
}

/// The five sub-score weights. Need not sum exactly to 1; a sum far
/// from 1 is advisory only.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    pub engagement: f64,
    pub comments: f64,
    pub recency: f64,
    pub content: f64,
    pub ratio: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            engagement: 0.30,
            comments: 0.25,
            recency: 0.20,
            content: 0.15,
            ratio: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.engagement + self.comments + self.recency + self.content + self.ratio
    }
}

/// The five-tier length scoring table. Thresholds are strictly
/// ascending; the tier beyond `substantial` ("wall of text") scores
/// lower than `substantial` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRubric {
    pub very_short_threshold: usize,
    pub brief_threshold: usize,
    pub good_threshold: usize,
    pub substantial_threshold: usize,
    pub very_short_score: f64,
    pub brief_score: f64,
    pub good_score: f64,
    pub substantial_score: f64,
    pub wall_of_text_score: f64,
}

impl Default for ContentRubric {
    fn default() -> Self {
        Self {
            very_short_threshold: 50,
            brief_threshold: 200,
            good_threshold: 1000,
            substantial_threshold: 3000,
            very_short_score: 0.3,
            brief_score: 0.5,
            good_score: 0.8,
            substantial_score: 1.0,
            wall_of_text_score: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormattingLimits {
    pub max_selftext_length: usize,
    pub max_comment_body_length: usize,
    pub max_top_comments: usize,
}

impl Default for FormattingLimits {
    fn default() -> Self {
        Self {
            max_selftext_length: 500,
            max_comment_body_length: 300,
            max_top_comments: 5,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // Defaults always pass validation.
        Self::resolve(RawConfig::default()).expect("default config is valid")
    }
}

impl AppConfig {
    /// Load and resolve configuration from a YAML file. A missing file
    /// substitutes defaults with a warning; a malformed or structurally
    /// invalid file is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => RawConfig::default(),
            Ok(text) => serde_yaml::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file not found at {}, using defaults", path.display());
                RawConfig::default()
            }
            Err(e) => {
                return Err(ConfigError::InvalidFormat {
                    details: format!("cannot read {}: {}", path.display(), e),
                })
            }
        };

        Self::resolve(raw)
    }

    /// Parse configuration from a YAML string. Exposed for tests.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Self::resolve(RawConfig::default());
        }
        let raw: RawConfig = serde_yaml::from_str(text)?;
        Self::resolve(raw)
    }

    /// Resolve every absent field to its documented default, then
    /// validate. Advisory issues go to the diagnostic stream only.
    pub fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let reddit = raw.reddit.unwrap_or_default();
        let fetch = raw.fetch.unwrap_or_default();
        let time_window = raw.time_window.unwrap_or_default();
        let scoring = raw.scoring.unwrap_or_default();
        let thresholds = raw.content_thresholds.unwrap_or_default();
        let scores = raw.content_scores.unwrap_or_default();
        let formatting = raw.formatting.unwrap_or_default();

        let weight_defaults = ScoreWeights::default();
        let rubric_defaults = ContentRubric::default();
        let format_defaults = FormattingLimits::default();

        let config = Self {
            reddit: RedditCredentials {
                client_id: reddit.client_id.unwrap_or_default(),
                client_secret: reddit.client_secret.unwrap_or_default(),
                user_agent: reddit
                    .user_agent
                    .unwrap_or_else(|| "reddit-digest/1.0".to_string()),
            },
            fetch: FetchSettings {
                max_posts_per_subreddit: fetch.max_posts_per_subreddit.unwrap_or(50),
                max_comments_per_post: fetch.max_comments_per_post.unwrap_or(20),
                min_score: fetch.min_score.unwrap_or(5),
                rate_limit_delay_secs: fetch.rate_limit_delay.unwrap_or(2),
            },
            time_window: TimeWindowSettings {
                start: time_window.start,
                end: time_window.end,
                default_days: time_window.default_days.unwrap_or(7),
            },
            scoring: ScoreWeights {
                engagement: scoring.engagement_weight.unwrap_or(weight_defaults.engagement),
                comments: scoring.comments_weight.unwrap_or(weight_defaults.comments),
                recency: scoring.recency_weight.unwrap_or(weight_defaults.recency),
                content: scoring.content_weight.unwrap_or(weight_defaults.content),
                ratio: scoring.ratio_weight.unwrap_or(weight_defaults.ratio),
            },
            content: ContentRubric {
                very_short_threshold: thresholds
                    .very_short
                    .unwrap_or(rubric_defaults.very_short_threshold),
                brief_threshold: thresholds.brief.unwrap_or(rubric_defaults.brief_threshold),
                good_threshold: thresholds.good.unwrap_or(rubric_defaults.good_threshold),
                substantial_threshold: thresholds
                    .substantial
                    .unwrap_or(rubric_defaults.substantial_threshold),
                very_short_score: scores.very_short.unwrap_or(rubric_defaults.very_short_score),
                brief_score: scores.brief.unwrap_or(rubric_defaults.brief_score),
                good_score: scores.good.unwrap_or(rubric_defaults.good_score),
                substantial_score: scores
                    .substantial
                    .unwrap_or(rubric_defaults.substantial_score),
                wall_of_text_score: scores
                    .wall_of_text
                    .unwrap_or(rubric_defaults.wall_of_text_score),
            },
            formatting: FormattingLimits {
                max_selftext_length: formatting
                    .max_selftext_length
                    .unwrap_or(format_defaults.max_selftext_length),
                max_comment_body_length: formatting
                    .max_comment_body_length
                    .unwrap_or(format_defaults.max_comment_body_length),
                max_top_comments: formatting
                    .max_top_comments
                    .unwrap_or(format_defaults.max_top_comments),
            },
            subreddits: raw.subreddits.unwrap_or_else(|| {
                DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect()
            }),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.content;
        let thresholds = [
            c.very_short_threshold,
            c.brief_threshold,
            c.good_threshold,
            c.substantial_threshold,
        ];
        if !thresholds.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "content_thresholds must be strictly ascending, got {:?}",
                    thresholds
                ),
            });
        }

        for (name, score) in [
            ("very_short", c.very_short_score),
            ("brief", c.brief_score),
            ("good", c.good_score),
            ("substantial", c.substantial_score),
            ("wall_of_text", c.wall_of_text_score),
        ] {
            if !(0.0..=1.0).contains(&score) {
                return Err(ConfigError::InvalidValue {
                    field: format!("content_scores.{name}"),
                    value: score.to_string(),
                });
            }
        }

        let w = &self.scoring;
        for (name, weight) in [
            ("engagement_weight", w.engagement),
            ("comments_weight", w.comments),
            ("recency_weight", w.recency),
            ("content_weight", w.content),
            ("ratio_weight", w.ratio),
        ] {
            if weight < 0.0 || !weight.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: format!("scoring.{name}"),
                    value: weight.to_string(),
                });
            }
        }

        let sum = w.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warn!("Scoring weights sum to {sum:.3}, expected ~1.0");
        }

        if self.subreddits.is_empty() {
            warn!("Subreddit list is empty, nothing will be fetched");
        }
        let mut seen = HashSet::new();
        for name in &self.subreddits {
            if !seen.insert(name.as_str()) {
                warn!("Duplicate subreddit in config: {name}");
            }
        }

        Ok(())
    }
}
