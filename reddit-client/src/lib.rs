//! Reddit content source for the digest pipeline.
//!
//! Two fetch strategies share one merge contract: the authenticated
//! OAuth API when credentials are configured, the public read-only
//! JSON endpoint otherwise. Strategy selection happens once at
//! startup and a failed authentication falls back rather than aborts.

pub mod api;
pub mod auth;
pub mod pacer;
pub mod source;

pub use pacer::{Boundary, FixedDelayPacer, NoopPacer, Pacer};
pub use source::{AuthenticatedSource, FetchPosts, PublicJsonSource, RedditFetcher};
