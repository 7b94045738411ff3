use digest_core::types::{
    clip_chars, Comment, Post, DELETED_AUTHOR, DELETED_BODY, MAX_COMMENT_BODY_LEN,
    MAX_SELFTEXT_LEN, MAX_TITLE_LEN, REMOVED_BODY,
};
use digest_core::RedditApiError;
use serde::Deserialize;

pub const OAUTH_API_BASE: &str = "https://oauth.reddit.com";
pub const PUBLIC_API_BASE: &str = "https://www.reddit.com";
pub const AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Thing kinds we care about. Anything else (notably "more", the
/// continue-thread stub) is discarded at the parse boundary.
pub const KIND_POST: &str = "t3";
pub const KIND_COMMENT: &str = "t1";

/// The three listings merged per subreddit, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    New,
    Hot,
    TopWeek,
}

impl ListingKind {
    pub const MERGE_ORDER: [ListingKind; 3] =
        [ListingKind::New, ListingKind::Hot, ListingKind::TopWeek];

    pub fn path(&self) -> &'static str {
        match self {
            ListingKind::New => "new",
            ListingKind::Hot => "hot",
            ListingKind::TopWeek => "top",
        }
    }

    /// The `t=` interval parameter, only meaningful for top listings.
    pub fn time_filter(&self) -> Option<&'static str> {
        match self {
            ListingKind::TopWeek => Some("week"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<Thing<T>>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

/// Raw post record as the API returns it. Every field is defaulted so
/// a sparse record degrades to documented sentinels instead of failing
/// the whole fetch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub upvote_ratio: Option<f64>,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub link_flair_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub created_utc: f64,
}

/// Normalize a raw post into the pipeline's uniform shape. This is the
/// only place raw provider records are touched.
pub fn extract_post(raw: RawPost, subreddit: &str) -> Post {
    let created_datetime =
        chrono::DateTime::from_timestamp(raw.created_utc as i64, 0).unwrap_or_default();

    Post {
        id: raw.id,
        title: clip_chars(&raw.title, MAX_TITLE_LEN),
        author: raw
            .author
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
        subreddit: subreddit.to_string(),
        score: raw.score,
        upvote_ratio: raw.upvote_ratio.unwrap_or(0.0),
        num_comments: raw.num_comments,
        created_utc: raw.created_utc,
        created_datetime,
        url: raw.url,
        permalink: format!("https://reddit.com{}", raw.permalink),
        selftext: clip_chars(&raw.selftext, MAX_SELFTEXT_LEN),
        is_self: raw.is_self,
        link_flair_text: raw.link_flair_text.unwrap_or_default(),
        comments: Vec::new(),
        heuristic_score: None,
    }
}

/// Normalize a raw comment, or drop it: deletion placeholders and
/// empty bodies are not represented at all.
pub fn extract_comment(raw: RawComment) -> Option<Comment> {
    if raw.body.is_empty() || raw.body == DELETED_BODY || raw.body == REMOVED_BODY {
        return None;
    }

    Some(Comment {
        id: raw.id,
        author: raw
            .author
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
        body: clip_chars(&raw.body, MAX_COMMENT_BODY_LEN),
        score: raw.score,
        created_utc: raw.created_utc,
    })
}

/// Keep only real post things from a listing.
pub fn posts_from_listing(listing: Listing<RawPost>) -> Vec<RawPost> {
    listing
        .data
        .children
        .into_iter()
        .filter(|thing| thing.kind == KIND_POST)
        .map(|thing| thing.data)
        .collect()
}

/// Keep only real comments: "more" stubs and sentinel bodies vanish.
pub fn comments_from_things(things: Vec<Thing<RawComment>>) -> Vec<Comment> {
    things
        .into_iter()
        .filter(|thing| thing.kind == KIND_COMMENT)
        .filter_map(|thing| extract_comment(thing.data))
        .collect()
}

/// Map a non-success HTTP response to the API error taxonomy.
pub(crate) fn check_response(
    response: &reqwest::Response,
    resource: &str,
) -> Result<(), RedditApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            Err(RedditApiError::RateLimitExceeded { retry_after })
        }
        401 => Err(RedditApiError::AuthenticationFailed {
            reason: format!("unauthorized for {resource}"),
        }),
        403 => Err(RedditApiError::Forbidden {
            resource: resource.to_string(),
        }),
        404 => Err(RedditApiError::SubredditNotFound {
            subreddit: resource.to_string(),
        }),
        code if status.is_server_error() => Err(RedditApiError::ServerError { status_code: code }),
        _ => Err(RedditApiError::InvalidResponse {
            details: format!("HTTP {status} for {resource}"),
        }),
    }
}
