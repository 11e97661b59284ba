//! GraphQL documents, variables, and query shapes.
//!
//! Each document selects `rateLimit` alongside its payload so that every
//! response refreshes the shared budget. Values are always passed through
//! `variables`; query text is never assembled from user input.

use serde::Serialize;

use super::locator::RepositoryTarget;
use super::models::{CommentParent, CommentParentKey, EntityKind};

const ISSUE_PAGE_QUERY: &str = r"
query IssuePage($owner: String!, $name: String!, $first: Int!, $after: String, $commentsFirst: Int!) {
  rateLimit { limit cost remaining resetAt }
  repository(owner: $owner, name: $name) {
    issues(first: $first, after: $after, states: [OPEN, CLOSED], orderBy: {field: CREATED_AT, direction: ASC}) {
      nodes {
        id number title author { login } createdAt updatedAt url bodyText state
        comments(first: $commentsFirst) {
          totalCount
          nodes { id author { login } createdAt updatedAt url bodyText }
          pageInfo { endCursor hasNextPage }
        }
      }
      pageInfo { endCursor hasNextPage }
    }
  }
}";

const PULL_REQUEST_PAGE_QUERY: &str = r"
query PullRequestPage($owner: String!, $name: String!, $first: Int!, $after: String, $commentsFirst: Int!) {
  rateLimit { limit cost remaining resetAt }
  repository(owner: $owner, name: $name) {
    pullRequests(first: $first, after: $after, states: [OPEN, CLOSED, MERGED], orderBy: {field: CREATED_AT, direction: ASC}) {
      nodes {
        id number title author { login } createdAt updatedAt url bodyText state
        comments(first: $commentsFirst) {
          totalCount
          nodes { id author { login } createdAt updatedAt url bodyText }
          pageInfo { endCursor hasNextPage }
        }
      }
      pageInfo { endCursor hasNextPage }
    }
  }
}";

const COMMIT_PAGE_QUERY: &str = r"
query CommitPage($owner: String!, $name: String!, $first: Int!, $after: String, $commentsFirst: Int!) {
  rateLimit { limit cost remaining resetAt }
  repository(owner: $owner, name: $name) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: $first, after: $after) {
            nodes {
              oid author { user { login } name } committedDate url
              messageHeadline messageBody additions deletions
              comments(first: $commentsFirst) {
                totalCount
                nodes { id author { login } createdAt updatedAt url bodyText }
                pageInfo { endCursor hasNextPage }
              }
            }
            pageInfo { endCursor hasNextPage }
          }
        }
      }
    }
  }
}";

const ISSUE_COMMENTS_QUERY: &str = r"
query IssueComments($owner: String!, $name: String!, $number: Int!, $first: Int!, $after: String) {
  rateLimit { limit cost remaining resetAt }
  repository(owner: $owner, name: $name) {
    issue(number: $number) {
      comments(first: $first, after: $after) {
        totalCount
        nodes { id author { login } createdAt updatedAt url bodyText }
        pageInfo { endCursor hasNextPage }
      }
    }
  }
}";

const PULL_REQUEST_COMMENTS_QUERY: &str = r"
query PullRequestComments($owner: String!, $name: String!, $number: Int!, $first: Int!, $after: String) {
  rateLimit { limit cost remaining resetAt }
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      comments(first: $first, after: $after) {
        totalCount
        nodes { id author { login } createdAt updatedAt url bodyText }
        pageInfo { endCursor hasNextPage }
      }
    }
  }
}";

const COMMIT_COMMENTS_QUERY: &str = r"
query CommitComments($owner: String!, $name: String!, $oid: GitObjectID!, $first: Int!, $after: String) {
  rateLimit { limit cost remaining resetAt }
  repository(owner: $owner, name: $name) {
    object(oid: $oid) {
      ... on Commit {
        comments(first: $first, after: $after) {
          totalCount
          nodes { id author { login } createdAt updatedAt url bodyText }
          pageInfo { endCursor hasNextPage }
        }
      }
    }
  }
}";

const RATE_LIMIT_QUERY: &str = r"
query RateLimit {
  rateLimit { limit cost remaining resetAt }
}";

/// Which connection a query walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTarget {
    /// Top-level entities with their first page of comments nested.
    Entities,
    /// Follow-up comment pages for one entity.
    Comments,
}

/// Cost-relevant description of a query: what it walks and how wide.
///
/// Queries with the same shape cost the same number of points, so the budget
/// tracker keys its measured costs by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryShape {
    /// Entity kind being walked.
    pub kind: EntityKind,
    /// Connection being walked.
    pub target: QueryTarget,
    /// `first` of the walked connection.
    pub page_size: u32,
    /// `first` of the nested comment connection; zero when none is nested.
    pub nested_page_size: u32,
}

/// Request for one page of top-level entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPageRequest {
    /// Repository to read.
    pub target: RepositoryTarget,
    /// Entity kind to read.
    pub kind: EntityKind,
    /// Cursor returned by the previous page.
    pub after: Option<String>,
    /// Entities per page.
    pub page_size: u32,
    /// Comments fetched inline with each entity.
    pub comment_page_size: u32,
}

impl EntityPageRequest {
    /// Shape of the query this request issues.
    #[must_use]
    pub const fn shape(&self) -> QueryShape {
        QueryShape {
            kind: self.kind,
            target: QueryTarget::Entities,
            page_size: self.page_size,
            nested_page_size: self.comment_page_size,
        }
    }

    /// Operation name sent to GitHub, also used in logs and errors.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self.kind {
            EntityKind::Issue => "IssuePage",
            EntityKind::PullRequest => "PullRequestPage",
            EntityKind::Commit => "CommitPage",
        }
    }

    pub(crate) fn body(&self) -> GraphQlRequest<'_> {
        let query = match self.kind {
            EntityKind::Issue => ISSUE_PAGE_QUERY,
            EntityKind::PullRequest => PULL_REQUEST_PAGE_QUERY,
            EntityKind::Commit => COMMIT_PAGE_QUERY,
        };
        GraphQlRequest {
            operation_name: self.operation(),
            query,
            variables: Variables {
                owner: Some(self.target.owner().as_str()),
                name: Some(self.target.name().as_str()),
                first: Some(self.page_size),
                after: self.after.as_deref(),
                comments_first: Some(self.comment_page_size),
                number: None,
                oid: None,
            },
        }
    }
}

/// Request for one page of an entity's comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPageRequest {
    /// Repository holding the parent entity.
    pub target: RepositoryTarget,
    /// Parent entity.
    pub parent: CommentParent,
    /// Cursor returned by the previous comment page.
    pub after: Option<String>,
    /// Comments per page.
    pub page_size: u32,
}

impl CommentPageRequest {
    /// Shape of the query this request issues.
    #[must_use]
    pub const fn shape(&self) -> QueryShape {
        QueryShape {
            kind: self.parent.kind,
            target: QueryTarget::Comments,
            page_size: self.page_size,
            nested_page_size: 0,
        }
    }

    /// Operation name sent to GitHub, also used in logs and errors.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self.parent.kind {
            EntityKind::Issue => "IssueComments",
            EntityKind::PullRequest => "PullRequestComments",
            EntityKind::Commit => "CommitComments",
        }
    }

    pub(crate) fn body(&self) -> GraphQlRequest<'_> {
        let query = match self.parent.kind {
            EntityKind::Issue => ISSUE_COMMENTS_QUERY,
            EntityKind::PullRequest => PULL_REQUEST_COMMENTS_QUERY,
            EntityKind::Commit => COMMIT_COMMENTS_QUERY,
        };
        let (number, oid) = match &self.parent.key {
            CommentParentKey::Number(number) => (Some(*number), None),
            CommentParentKey::Oid(oid) => (None, Some(oid.as_str())),
        };
        GraphQlRequest {
            operation_name: self.operation(),
            query,
            variables: Variables {
                owner: Some(self.target.owner().as_str()),
                name: Some(self.target.name().as_str()),
                first: Some(self.page_size),
                after: self.after.as_deref(),
                comments_first: None,
                number,
                oid,
            },
        }
    }
}

/// Operation name of the standalone rate limit query.
pub(crate) const RATE_LIMIT_OPERATION: &str = "RateLimit";

pub(crate) const fn rate_limit_body() -> GraphQlRequest<'static> {
    GraphQlRequest {
        operation_name: RATE_LIMIT_OPERATION,
        query: RATE_LIMIT_QUERY,
        variables: Variables {
            owner: None,
            name: None,
            first: None,
            after: None,
            comments_first: None,
            number: None,
            oid: None,
        },
    }
}

/// JSON body posted to the GraphQL endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphQlRequest<'a> {
    operation_name: &'static str,
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Variables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comments_first: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    oid: Option<&'a str>,
}
