//! Gateway for paging through GitHub's GraphQL API.
//!
//! The crawl layer talks to GitHub only through [`CrawlGateway`], so walkers
//! and orchestrators can be exercised against mocks while
//! [`OctocrabCrawlGateway`] handles real HTTP requests. Each call issues
//! exactly one request and returns either a decoded page or a classified
//! [`FetchError`].

mod client;
mod error_mapping;
mod graphql;
mod http_utils;

pub use graphql::OctocrabCrawlGateway;

use async_trait::async_trait;

use crate::github::error::FetchError;
use crate::github::models::{CommentPage, EntityPage};
use crate::github::query::{CommentPageRequest, EntityPageRequest};
use crate::github::rate_limit::RateLimitInfo;

/// Single-request access to the pages the crawler walks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrawlGateway: Send + Sync {
    /// Fetch one page of top-level entities with their first comments nested.
    async fn entity_page(&self, request: &EntityPageRequest) -> Result<EntityPage, FetchError>;

    /// Fetch one follow-up page of an entity's comments.
    async fn comment_page(&self, request: &CommentPageRequest)
    -> Result<CommentPage, FetchError>;

    /// Read the current point budget without touching any repository.
    async fn rate_limit(&self) -> Result<RateLimitInfo, FetchError>;
}
