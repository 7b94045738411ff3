use crate::api::{
    self, check_response, extract_post, Listing, ListingKind, RawComment, RawPost, OAUTH_API_BASE,
    PUBLIC_API_BASE,
};
use crate::auth;
use crate::pacer::{Boundary, Pacer};
use async_trait::async_trait;
use chrono::Utc;
use digest_core::{
    AppConfig, FetchArtifact, FetchMetadata, FetchMode, FetchSettings, Post, RedditApiError,
    TimeWindow,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// One fetch strategy. Selected once at startup from credential
/// presence; never re-selected mid-run.
#[async_trait]
pub trait FetchPosts: Send + Sync {
    async fn fetch_subreddit(
        &self,
        subreddit: &str,
        window: &TimeWindow,
    ) -> Result<Vec<Post>, RedditApiError>;
}

fn build_http_client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
}

fn map_transport(error: reqwest::Error) -> RedditApiError {
    if error.is_timeout() {
        RedditApiError::RequestTimeout
    } else {
        RedditApiError::Transport(error)
    }
}

/// Merge one listing's raw posts into a community's accumulator,
/// deduplicating by id (first occurrence wins) and applying the window
/// and minimum-score filters. Filtered posts still claim their id, so
/// a later listing cannot resurrect them.
pub(crate) fn merge_listing(
    raws: Vec<RawPost>,
    subreddit: &str,
    window: &TimeWindow,
    min_score: i64,
    max_posts: usize,
    seen: &mut HashSet<String>,
    posts: &mut Vec<Post>,
) {
    for raw in raws {
        if posts.len() >= max_posts {
            return;
        }
        if !seen.insert(raw.id.clone()) {
            continue;
        }

        let post = extract_post(raw, subreddit);
        if !window.contains(post.created_datetime) {
            continue;
        }
        if post.score < min_score {
            continue;
        }

        posts.push(post);
    }
}

/// Authenticated strategy: OAuth bearer against oauth.reddit.com, with
/// per-post comment fetching.
pub struct AuthenticatedSource {
    client: reqwest::Client,
    token: String,
    fetch: FetchSettings,
    pacer: Arc<dyn Pacer>,
}

impl AuthenticatedSource {
    pub fn new(token: String, user_agent: &str, fetch: FetchSettings, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            client: build_http_client(user_agent),
            token,
            fetch,
            pacer,
        }
    }

    async fn fetch_listing(
        &self,
        subreddit: &str,
        kind: ListingKind,
    ) -> Result<Vec<RawPost>, RedditApiError> {
        let url = format!("{OAUTH_API_BASE}/r/{subreddit}/{}", kind.path());
        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("limit", self.fetch.max_posts_per_subreddit.to_string())]);
        if let Some(interval) = kind.time_filter() {
            request = request.query(&[("t", interval)]);
        }

        let response = request.send().await.map_err(map_transport)?;
        check_response(&response, subreddit)?;

        let listing: Listing<RawPost> = response.json().await.map_err(|e| {
            RedditApiError::InvalidResponse {
                details: format!("failed to parse {} listing for r/{subreddit}: {e}", kind.path()),
            }
        })?;
        Ok(api::posts_from_listing(listing))
    }

    async fn fetch_comments(
        &self,
        post_id: &str,
    ) -> Result<Vec<digest_core::Comment>, RedditApiError> {
        let url = format!("{OAUTH_API_BASE}/comments/{post_id}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("limit", self.fetch.max_comments_per_post.to_string())])
            .send()
            .await
            .map_err(map_transport)?;
        check_response(&response, post_id)?;

        // The comments endpoint returns a two-element array: the post
        // listing, then the comment tree.
        let (_, comment_listing): (serde_json::Value, Listing<RawComment>) =
            response.json().await.map_err(|e| RedditApiError::InvalidResponse {
                details: format!("failed to parse comments for {post_id}: {e}"),
            })?;

        let mut comments = api::comments_from_things(comment_listing.data.children);
        comments.truncate(self.fetch.max_comments_per_post);
        Ok(comments)
    }
}

#[async_trait]
impl FetchPosts for AuthenticatedSource {
    async fn fetch_subreddit(
        &self,
        subreddit: &str,
        window: &TimeWindow,
    ) -> Result<Vec<Post>, RedditApiError> {
        let mut seen = HashSet::new();
        let mut posts = Vec::new();

        for kind in ListingKind::MERGE_ORDER {
            if posts.len() >= self.fetch.max_posts_per_subreddit {
                break;
            }
            let raws = self.fetch_listing(subreddit, kind).await?;
            merge_listing(
                raws,
                subreddit,
                window,
                self.fetch.min_score,
                self.fetch.max_posts_per_subreddit,
                &mut seen,
                &mut posts,
            );
        }

        for post in &mut posts {
            match self.fetch_comments(&post.id).await {
                Ok(comments) => post.comments = comments,
                // One post's comment failure never sinks the run.
                Err(e) => warn!("Could not fetch comments for {}: {e}", post.id),
            }
            self.pacer.pause(Boundary::AfterPostComments).await;
        }

        Ok(posts)
    }
}

/// Unauthenticated strategy: the public read-only JSON endpoint. Never
/// fetches comments; the tighter rate budget goes to listings.
pub struct PublicJsonSource {
    client: reqwest::Client,
    fetch: FetchSettings,
    pacer: Arc<dyn Pacer>,
}

impl PublicJsonSource {
    pub fn new(user_agent: &str, fetch: FetchSettings, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            client: build_http_client(user_agent),
            fetch,
            pacer,
        }
    }

    async fn fetch_listing(
        &self,
        subreddit: &str,
        kind: ListingKind,
    ) -> Result<Vec<RawPost>, RedditApiError> {
        let url = format!("{PUBLIC_API_BASE}/r/{subreddit}/{}.json", kind.path());
        let limit = self.fetch.max_posts_per_subreddit.min(100);
        let mut request = self.client.get(&url).query(&[("limit", limit.to_string())]);
        if let Some(interval) = kind.time_filter() {
            request = request.query(&[("t", interval)]);
        }

        let response = request.send().await.map_err(map_transport)?;
        check_response(&response, subreddit)?;

        let listing: Listing<RawPost> = response.json().await.map_err(|e| {
            RedditApiError::InvalidResponse {
                details: format!("failed to parse {} listing for r/{subreddit}: {e}", kind.path()),
            }
        })?;
        Ok(api::posts_from_listing(listing))
    }
}

#[async_trait]
impl FetchPosts for PublicJsonSource {
    async fn fetch_subreddit(
        &self,
        subreddit: &str,
        window: &TimeWindow,
    ) -> Result<Vec<Post>, RedditApiError> {
        let mut seen = HashSet::new();
        let mut posts = Vec::new();

        for kind in ListingKind::MERGE_ORDER {
            if posts.len() >= self.fetch.max_posts_per_subreddit {
                break;
            }
            let raws = self.fetch_listing(subreddit, kind).await?;
            merge_listing(
                raws,
                subreddit,
                window,
                self.fetch.min_score,
                self.fetch.max_posts_per_subreddit,
                &mut seen,
                &mut posts,
            );
            self.pacer.pause(Boundary::AfterListing).await;
        }

        Ok(posts)
    }
}

/// The pipeline's content source: one strategy plus the pacing policy,
/// fanned across subreddits strictly sequentially.
pub struct RedditFetcher {
    source: Box<dyn FetchPosts>,
    pacer: Arc<dyn Pacer>,
    mode: FetchMode,
}

impl RedditFetcher {
    /// Pick the fetch strategy from credential presence. Failed
    /// authentication logs a warning and falls back to the public
    /// endpoint rather than aborting the run.
    pub async fn connect(config: &AppConfig, pacer: Arc<dyn Pacer>) -> Self {
        if config.reddit.is_present() {
            match auth::request_app_token(&config.reddit).await {
                Ok(token) => {
                    info!("Authenticated with Reddit API");
                    let source = AuthenticatedSource::new(
                        token,
                        &config.reddit.user_agent,
                        config.fetch.clone(),
                        Arc::clone(&pacer),
                    );
                    return Self {
                        source: Box::new(source),
                        pacer,
                        mode: FetchMode::Authenticated,
                    };
                }
                Err(e) => {
                    warn!("Reddit authentication failed: {e}");
                    warn!("Falling back to unauthenticated mode");
                }
            }
        } else {
            info!("No Reddit API credentials found, using unauthenticated mode");
            info!("(Rate limits will be more restrictive)");
        }

        let source = PublicJsonSource::new(
            &config.reddit.user_agent,
            config.fetch.clone(),
            Arc::clone(&pacer),
        );
        Self {
            source: Box::new(source),
            pacer,
            mode: FetchMode::Public,
        }
    }

    /// Build a fetcher around an explicit strategy. Used in tests.
    pub fn with_source(source: Box<dyn FetchPosts>, pacer: Arc<dyn Pacer>, mode: FetchMode) -> Self {
        Self { source, pacer, mode }
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Fetch every subreddit sequentially. Per-community failures are
    /// logged and contribute zero posts; the run always completes. The
    /// merged corpus is globally sorted by raw score descending, the
    /// contract's only ordering guarantee.
    pub async fn fetch_all(&self, subreddits: &[String], window: &TimeWindow) -> FetchArtifact {
        info!("Fetching posts from {} subreddits", subreddits.len());
        info!("Time window: {} to {}", window.start, window.end);
        info!(
            "Mode: {}",
            if self.mode.is_authenticated() {
                "Authenticated"
            } else {
                "Unauthenticated"
            }
        );

        let mut all_posts: Vec<Post> = Vec::new();
        let total = subreddits.len();

        for (index, subreddit) in subreddits.iter().enumerate() {
            info!("[{}/{}] Fetching r/{subreddit}", index + 1, total);

            match self.source.fetch_subreddit(subreddit, window).await {
                Ok(posts) => {
                    info!("Found {} posts in r/{subreddit}", posts.len());
                    all_posts.extend(posts);
                }
                Err(e) => {
                    error!("Error fetching from r/{subreddit}: {e}");
                }
            }

            if index + 1 < total {
                self.pacer.pause(Boundary::AfterSubreddit).await;
            }
        }

        all_posts.sort_by(|a, b| b.score.cmp(&a.score));
        info!("Total: {} posts fetched", all_posts.len());

        FetchArtifact {
            metadata: FetchMetadata {
                fetch_time: Utc::now(),
                start_time: window.start,
                end_time: window.end,
                subreddits: subreddits.to_vec(),
                total_posts: all_posts.len(),
                authenticated: self.mode.is_authenticated(),
            },
            posts: all_posts,
        }
    }
}
