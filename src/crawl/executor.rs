//! Single-request page fetching that keeps the rate budget current.

use std::sync::Arc;

use crate::github::error::FetchError;
use crate::github::gateway::CrawlGateway;
use crate::github::models::{CommentPage, EntityPage};
use crate::github::query::{CommentPageRequest, EntityPageRequest, QueryShape};
use crate::github::rate_limit::RateLimitInfo;

use super::budget::RateBudget;

/// Issues one GraphQL request per call and feeds the response's rate limit
/// metadata back into the shared [`RateBudget`].
///
/// Admission is left to the caller so that retries and waits stay in one
/// place.
#[derive(Clone)]
pub struct QueryExecutor {
    gateway: Arc<dyn CrawlGateway>,
    budget: RateBudget,
}

impl QueryExecutor {
    /// Creates an executor over `gateway` sharing `budget`.
    #[must_use]
    pub fn new(gateway: Arc<dyn CrawlGateway>, budget: RateBudget) -> Self {
        Self { gateway, budget }
    }

    /// Budget this executor reports into.
    #[must_use]
    pub const fn budget(&self) -> &RateBudget {
        &self.budget
    }

    /// Fetches one page of entities.
    ///
    /// # Errors
    ///
    /// Returns the classified [`FetchError`] from the gateway.
    pub async fn fetch_page(&self, request: &EntityPageRequest) -> Result<EntityPage, FetchError> {
        let result = self.gateway.entity_page(request).await;
        let info = match &result {
            Ok(page) => page.rate_limit,
            Err(error) => throttled_rate_limit(error),
        };
        self.observe(request.shape(), info).await;
        result
    }

    /// Fetches one follow-up page of comments.
    ///
    /// # Errors
    ///
    /// Returns the classified [`FetchError`] from the gateway.
    pub async fn fetch_comments(
        &self,
        request: &CommentPageRequest,
    ) -> Result<CommentPage, FetchError> {
        let result = self.gateway.comment_page(request).await;
        let info = match &result {
            Ok(page) => page.rate_limit,
            Err(error) => throttled_rate_limit(error),
        };
        self.observe(request.shape(), info).await;
        result
    }

    /// Queries the current budget directly.
    ///
    /// # Errors
    ///
    /// Returns the classified [`FetchError`] from the gateway.
    pub async fn rate_limit(&self) -> Result<RateLimitInfo, FetchError> {
        self.gateway.rate_limit().await
    }

    async fn observe(&self, shape: QueryShape, info: Option<RateLimitInfo>) {
        if let Some(snapshot) = info {
            self.budget.observe(shape, &snapshot).await;
        }
    }
}

const fn throttled_rate_limit(error: &FetchError) -> Option<RateLimitInfo> {
    match error {
        FetchError::RateLimited { rate_limit, .. } => *rate_limit,
        _ => None,
    }
}
