//! GitHub GraphQL access for the crawler.
//!
//! This module parses repository identifiers, describes the GraphQL pages the
//! crawler walks, decodes responses into flattened records, and classifies
//! every failure so that callers can decide whether to retry, wait, skip, or
//! abort without inspecting Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod pagination;
pub mod query;
pub mod rate_limit;

pub use error::{FailureClass, FetchError, TargetError};
pub use gateway::{CrawlGateway, OctocrabCrawlGateway};
pub use locator::{
    InvalidTarget, PersonalAccessToken, RepositoryName, RepositoryOwner, RepositoryTarget,
    TargetList,
};
pub use models::{
    CommentPage, CommentParent, CommentParentKey, CommentRecord, CommentedEntity, EntityKind,
    EntityPage, EntityRecord, PendingEntity, UnknownEntityKind,
};
pub use pagination::PageCursor;
pub use query::{CommentPageRequest, EntityPageRequest, QueryShape, QueryTarget};
pub use rate_limit::RateLimitInfo;

#[cfg(test)]
pub use gateway::MockCrawlGateway;
