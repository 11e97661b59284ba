//! Octocrab-backed GraphQL gateway.

use async_trait::async_trait;
use http::HeaderMap;
use octocrab::Octocrab;
use url::Url;

use crate::github::error::FetchError;
use crate::github::locator::PersonalAccessToken;
use crate::github::models::api::{ApiData, GraphQlResponse};
use crate::github::models::{CommentPage, EntityPage};
use crate::github::query::{
    CommentPageRequest, EntityPageRequest, GraphQlRequest, RATE_LIMIT_OPERATION, rate_limit_body,
};
use crate::github::rate_limit::RateLimitInfo;

use super::CrawlGateway;
use super::client::build_octocrab_client;
use super::error_mapping::{
    classify_graphql_errors, classify_status, error_body_message, map_octocrab_error,
};


const GRAPHQL_PATH: &str = "/graphql";

/// Octocrab-backed gateway posting GraphQL documents to `{api_base}/graphql`.
pub struct OctocrabCrawlGateway {
    client: Octocrab,
}

impl OctocrabCrawlGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an authenticated gateway for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Malformed`] when the base URL cannot be used to
    /// construct an Octocrab client.
    pub fn for_token(token: &PersonalAccessToken, api_base: &Url) -> Result<Self, FetchError> {
        let octocrab = build_octocrab_client(token, api_base)?;
        Ok(Self::new(octocrab))
    }

    /// Posts one GraphQL document and returns the classified result.
    ///
    /// The raw request API is used so that status codes and rate limit
    /// headers survive for classification.
    async fn post_graphql(
        &self,
        operation: &str,
        body: &GraphQlRequest<'_>,
    ) -> Result<(ApiData, HeaderMap), FetchError> {
        let response = self
            .client
            ._post(GRAPHQL_PATH, Some(body))
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        if !status.is_success() {
            return Err(classify_status(
                operation,
                status,
                &headers,
                error_body_message(&text),
            ));
        }

        let envelope: GraphQlResponse = serde_json::from_str(&text).map_err(|error| {
            FetchError::malformed(operation, format!("response deserialisation failed: {error}"))
        })?;

        if !envelope.errors.is_empty() {
            return Err(classify_graphql_errors(operation, &envelope.errors, &headers));
        }

        let data = envelope
            .data
            .ok_or_else(|| FetchError::malformed(operation, "response carried no data"))?;
        Ok((data, headers))
    }
}

#[async_trait]
impl CrawlGateway for OctocrabCrawlGateway {
    async fn entity_page(&self, request: &EntityPageRequest) -> Result<EntityPage, FetchError> {
        let operation = request.operation();
        let (data, headers) = self.post_graphql(operation, &request.body()).await?;
        let mut page = data.into_entity_page(operation, &request.target, request.kind)?;
        if page.rate_limit.is_none() {
            page.rate_limit = RateLimitInfo::from_headers(&headers);
        }
        Ok(page)
    }

    async fn comment_page(
        &self,
        request: &CommentPageRequest,
    ) -> Result<CommentPage, FetchError> {
        let operation = request.operation();
        let (data, headers) = self.post_graphql(operation, &request.body()).await?;
        let mut page = data.into_comment_page(operation, &request.target, &request.parent)?;
        if page.rate_limit.is_none() {
            page.rate_limit = RateLimitInfo::from_headers(&headers);
        }
        Ok(page)
    }

    async fn rate_limit(&self) -> Result<RateLimitInfo, FetchError> {
        let (data, _) = self
            .post_graphql(RATE_LIMIT_OPERATION, &rate_limit_body())
            .await?;
        data.into_rate_limit(RATE_LIMIT_OPERATION)
    }
}
