use crate::config::AppConfig;
use crate::scoring::{self, DEFAULT_MEDIAN_SCORE};
use crate::types::{
    FetchArtifact, FormattedComment, FormattedPost, Post, PreprocessingStats, ProcessedArtifact,
    ProcessedMetadata, TimeWindow,
};
use chrono::Utc;
use tracing::debug;

/// Marker appended to truncated text.
const ELLIPSIS: &str = "...";

/// Truncate to at most `max` characters, appending the ellipsis marker
/// only when something was actually cut. Text at or under the cap is
/// returned unchanged.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(max).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    }
}

/// Narrow a scored post to the token-efficient shape the summarizer
/// consumes. Comments are re-ranked by their own score and capped.
fn format_post(post: Post, config: &AppConfig) -> FormattedPost {
    let limits = &config.formatting;

    let mut comments = post.comments;
    comments.sort_by(|a, b| b.score.cmp(&a.score));
    comments.truncate(limits.max_top_comments);

    let top_comments = comments
        .into_iter()
        .map(|comment| FormattedComment {
            author: comment.author,
            score: comment.score,
            body: truncate_text(&comment.body, limits.max_comment_body_length),
        })
        .collect();

    FormattedPost {
        id: post.id,
        title: post.title,
        subreddit: post.subreddit,
        author: post.author,
        score: post.score,
        num_comments: post.num_comments,
        upvote_ratio: post.upvote_ratio,
        created_datetime: post.created_datetime,
        permalink: post.permalink,
        selftext: truncate_text(&post.selftext, limits.max_selftext_length),
        heuristic_score: post.heuristic_score.unwrap_or(0.0),
        top_comments,
    }
}

/// Score, rank, truncate, and narrow a fetched corpus.
///
/// The heavy lifting is total: nothing in here can fail on well-formed
/// input, so the return type carries no error.
pub fn preprocess_posts(
    artifact: FetchArtifact,
    config: &AppConfig,
    top_n: usize,
) -> ProcessedArtifact {
    let input_count = artifact.posts.len();
    let window = TimeWindow {
        start: artifact.metadata.start_time,
        end: artifact.metadata.end_time,
    };

    let medians = scoring::subreddit_medians(&artifact.posts);

    let mut posts = artifact.posts;
    for post in &mut posts {
        let median = medians
            .get(&post.subreddit)
            .copied()
            .unwrap_or(DEFAULT_MEDIAN_SCORE);
        post.heuristic_score = Some(scoring::compute_heuristic_score(
            post,
            median,
            &window,
            &config.scoring,
            &config.content,
        ));
    }

    // Stable sort: ties keep their arrival order.
    posts.sort_by(|a, b| {
        b.heuristic_score
            .unwrap_or(0.0)
            .total_cmp(&a.heuristic_score.unwrap_or(0.0))
    });
    posts.truncate(top_n);

    let formatted: Vec<FormattedPost> = posts
        .into_iter()
        .map(|post| format_post(post, config))
        .collect();

    let output_count = formatted.len();
    debug!(input_count, output_count, "preprocessing complete");

    ProcessedArtifact {
        metadata: ProcessedMetadata {
            fetch: artifact.metadata,
            preprocessed_at: Utc::now(),
        },
        posts: formatted,
        preprocessing: PreprocessingStats {
            input_count,
            output_count,
            filtered_count: input_count - output_count,
            subreddit_medians: medians,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Comment, FetchMetadata};
    use chrono::{TimeZone, Utc};

    fn metadata() -> FetchMetadata {
        FetchMetadata {
            fetch_time: Utc.with_ymd_and_hms(2025, 1, 8, 1, 0, 0).unwrap(),
            start_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap(),
            subreddits: vec!["rust".to_string()],
            total_posts: 0,
            authenticated: false,
        }
    }

    fn post(id: &str, score: i64) -> Post {
        let created = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        Post {
            id: id.to_string(),
            title: format!("Post {id}"),
            author: "tester".to_string(),
            subreddit: "rust".to_string(),
            score,
            upvote_ratio: 0.9,
            num_comments: 10,
            created_utc: created.timestamp() as f64,
            created_datetime: created,
            url: String::new(),
            permalink: format!("https://reddit.com/r/rust/comments/{id}"),
            selftext: "A reasonably sized body of text for the test post.".to_string(),
            is_self: true,
            link_flair_text: String::new(),
            comments: Vec::new(),
            heuristic_score: None,
        }
    }

    fn comment(id: &str, score: i64, body: &str) -> Comment {
        Comment {
            id: id.to_string(),
            author: "commenter".to_string(),
            body: body.to_string(),
            score,
            created_utc: 1736035200.0,
        }
    }

    #[test]
    fn body_under_cap_is_untouched() {
        assert_eq!(truncate_text("short", 500), "short");
    }

    #[test]
    fn body_exactly_at_cap_is_untouched() {
        let body = "x".repeat(500);
        assert_eq!(truncate_text(&body, 500), body);
    }

    #[test]
    fn body_over_cap_gains_ellipsis() {
        let body = "x".repeat(501);
        let out = truncate_text(&body, 500);
        assert_eq!(out.chars().count(), 503);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn selection_keeps_top_n_by_heuristic_score() {
        let mut fetched = FetchArtifact {
            metadata: metadata(),
            posts: vec![post("a", 100), post("b", 5), post("c", 50)],
        };
        fetched.metadata.total_posts = 3;

        let config = AppConfig::default();
        let result = preprocess_posts(fetched, &config, 2);

        // Median for the community is 50; the score-5 post ranks last.
        assert_eq!(result.preprocessing.subreddit_medians["rust"], 50.0);
        assert_eq!(result.posts.len(), 2);
        assert!(result.posts[0].heuristic_score >= result.posts[1].heuristic_score);
        assert!(result.posts.iter().all(|p| p.id != "b"));
        assert_eq!(result.preprocessing.input_count, 3);
        assert_eq!(result.preprocessing.output_count, 2);
        assert_eq!(result.preprocessing.filtered_count, 1);
    }

    #[test]
    fn comments_are_ranked_and_capped() {
        let mut p = post("a", 100);
        p.comments = vec![
            comment("c1", 3, "third"),
            comment("c2", 50, "first"),
            comment("c3", 10, "second"),
        ];
        let fetched = FetchArtifact {
            metadata: metadata(),
            posts: vec![p],
        };

        let mut config = AppConfig::default();
        config.formatting.max_top_comments = 2;
        let result = preprocess_posts(fetched, &config, 10);

        let comments = &result.posts[0].top_comments;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "first");
        assert_eq!(comments[1].body, "second");
    }

    #[test]
    fn comment_bodies_are_truncated_with_marker() {
        let mut p = post("a", 100);
        p.comments = vec![comment("c1", 1, &"y".repeat(400))];
        let fetched = FetchArtifact {
            metadata: metadata(),
            posts: vec![p],
        };

        let config = AppConfig::default();
        let result = preprocess_posts(fetched, &config, 10);
        let body = &result.posts[0].top_comments[0].body;
        assert_eq!(body.chars().count(), 303);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn empty_input_yields_empty_artifact() {
        let fetched = FetchArtifact {
            metadata: metadata(),
            posts: Vec::new(),
        };
        let result = preprocess_posts(fetched, &AppConfig::default(), 50);
        assert!(result.posts.is_empty());
        assert_eq!(result.preprocessing.input_count, 0);
        assert_eq!(result.preprocessing.output_count, 0);
        assert_eq!(result.preprocessing.filtered_count, 0);
        assert!(result.preprocessing.subreddit_medians.is_empty());
    }

    #[test]
    fn every_output_post_is_scored_in_band() {
        let fetched = FetchArtifact {
            metadata: metadata(),
            posts: (0..20).map(|i| post(&format!("p{i}"), i * 7)).collect(),
        };
        let result = preprocess_posts(fetched, &AppConfig::default(), 50);
        for p in &result.posts {
            assert!((1.0..=10.0).contains(&p.heuristic_score));
        }
    }
}
