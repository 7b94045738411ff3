use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Which request boundary was just crossed. The pacing policy is a
/// function of this, so tests can swap it out without touching the
/// fetch control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// A public-listing request finished.
    AfterListing,
    /// One post's comment fetch finished.
    AfterPostComments,
    /// One whole subreddit finished.
    AfterSubreddit,
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, boundary: Boundary);
}

/// The production policy: one fixed delay at every boundary, matching
/// Reddit's informal rate expectations for sequential clients.
#[derive(Debug, Clone)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn pause(&self, boundary: Boundary) {
        if self.delay.is_zero() {
            return;
        }
        debug!(?boundary, delay_ms = self.delay.as_millis() as u64, "pacing");
        tokio::time::sleep(self.delay).await;
    }
}

/// No delays at all, for tests.
#[derive(Debug, Clone, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self, _boundary: Boundary) {}
}
