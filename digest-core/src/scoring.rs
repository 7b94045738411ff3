use crate::config::{ContentRubric, ScoreWeights};
use crate::types::{Post, TimeWindow};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Fallback median for a subreddit absent from the computed map.
pub const DEFAULT_MEDIAN_SCORE: f64 = 10.0;

// Normalization constants of the engagement and comment formulas.
// The engagement divisor is calibrated so 1x median lands near 0.5
// for typical medians; it is a fixed constant, not a tunable.
const ENGAGEMENT_SCORE_DIVISOR: f64 = 2.0;
const COMMENTS_SCORE_DIVISOR: f64 = 3.0;

/// Median raw score per subreddit, used to normalize engagement across
/// communities of very different sizes.
pub fn subreddit_medians(posts: &[Post]) -> BTreeMap<String, f64> {
    let mut scores_by_subreddit: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for post in posts {
        scores_by_subreddit
            .entry(post.subreddit.clone())
            .or_default()
            .push(post.score);
    }

    scores_by_subreddit
        .into_iter()
        .map(|(subreddit, scores)| (subreddit, median(scores)))
        .collect()
}

fn median(mut scores: Vec<i64>) -> f64 {
    scores.sort_unstable();
    let n = scores.len();
    if n % 2 == 1 {
        scores[n / 2] as f64
    } else {
        (scores[n / 2 - 1] + scores[n / 2]) as f64 / 2.0
    }
}

/// Engagement sub-score in [0, 1].
///
/// Log-scaled so viral posts do not dominate, and normalized against
/// the subreddit median for fairness across communities.
pub fn compute_engagement_score(score: i64, median_score: f64) -> f64 {
    if score <= 0 {
        return 0.0;
    }

    let log_score = ((score as f64) + 1.0).log10();
    let log_median = (median_score.max(1.0) + 1.0).log10();

    (log_score / (log_median + ENGAGEMENT_SCORE_DIVISOR)).min(1.0)
}

/// Comment-volume sub-score in [0, 1], with diminishing returns:
/// 10 comments ~ 0.35, 100 ~ 0.67, 1000 ~ 1.0.
pub fn compute_comments_score(num_comments: u64) -> f64 {
    if num_comments == 0 {
        return 0.0;
    }

    (((num_comments as f64) + 1.0).log10() / COMMENTS_SCORE_DIVISOR).min(1.0)
}

/// Recency sub-score in [0, 1]: linear position of the creation
/// instant inside the window, clamped. A degenerate window scores 0.5.
pub fn compute_recency_score(created: DateTime<Utc>, window: &TimeWindow) -> f64 {
    let duration = window.duration_secs();
    if duration <= 0.0 {
        return 0.5;
    }

    let since_start = (created - window.start).num_milliseconds() as f64 / 1000.0;
    (since_start / duration).clamp(0.0, 1.0)
}

/// Content sub-score in [0, 1]: a step function of combined title and
/// body length. The top tier scores lower than `substantial` because a
/// wall of text is usually worth less than a tight long-form post.
pub fn compute_content_score(selftext: &str, title: &str, rubric: &ContentRubric) -> f64 {
    let total_length = selftext.chars().count() + title.chars().count();

    if total_length < rubric.very_short_threshold {
        rubric.very_short_score
    } else if total_length < rubric.brief_threshold {
        rubric.brief_score
    } else if total_length < rubric.good_threshold {
        rubric.good_score
    } else if total_length < rubric.substantial_threshold {
        rubric.substantial_score
    } else {
        rubric.wall_of_text_score
    }
}

/// Upvote-ratio sub-score in [0, 1]: 50% (maximally controversial)
/// floors at 0, 100% caps at 1.
pub fn compute_ratio_score(upvote_ratio: f64) -> f64 {
    ((upvote_ratio - 0.5) * 2.0).max(0.0)
}

/// Overall heuristic score in [1, 10] for one post. Pure: same inputs,
/// same output.
pub fn compute_heuristic_score(
    post: &Post,
    median_score: f64,
    window: &TimeWindow,
    weights: &ScoreWeights,
    rubric: &ContentRubric,
) -> f64 {
    let engagement = compute_engagement_score(post.score, median_score);
    let comments = compute_comments_score(post.num_comments);
    let recency = compute_recency_score(post.created_datetime, window);
    let content = compute_content_score(&post.selftext, &post.title, rubric);
    let ratio = compute_ratio_score(post.upvote_ratio);

    let raw = engagement * weights.engagement
        + comments * weights.comments
        + recency * weights.recency
        + content * weights.content
        + ratio * weights.ratio;

    round2(1.0 + raw * 9.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
