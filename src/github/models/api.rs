//! Strict serde schema for GitHub GraphQL responses.
//!
//! Every object rejects unknown fields and every field GitHub may null is an
//! explicit `Option`, so schema drift is reported rather than coerced.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::github::error::FetchError;
use crate::github::locator::RepositoryTarget;
use crate::github::pagination::{ApiPageInfo, PageCursor};
use crate::github::rate_limit::RateLimitInfo;

use super::{
    CommentPage, CommentParent, CommentParentKey, CommentRecord, EntityKind, EntityPage,
    EntityRecord, PendingEntity,
};

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    pub(crate) data: Option<ApiData>,
    #[serde(default)]
    pub(crate) errors: Vec<GraphQlError>,
}

/// Entry of the top-level `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphQlError {
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct ApiData {
    #[serde(default)]
    pub(crate) rate_limit: Option<ApiRateLimit>,
    #[serde(default)]
    repository: Option<ApiRepository>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct ApiRateLimit {
    limit: u32,
    cost: u32,
    remaining: u32,
    reset_at: DateTime<Utc>,
}

impl From<ApiRateLimit> for RateLimitInfo {
    fn from(value: ApiRateLimit) -> Self {
        let reset_at = u64::try_from(value.reset_at.timestamp()).ok();
        Self::new(value.limit, value.remaining, reset_at).with_cost(Some(value.cost))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ApiRepository {
    #[serde(default)]
    issues: Option<ApiConnection<ApiIssueNode>>,
    #[serde(default)]
    pull_requests: Option<ApiConnection<ApiIssueNode>>,
    #[serde(default)]
    default_branch_ref: Option<ApiBranchRef>,
    #[serde(default)]
    issue: Option<ApiCommentHolder>,
    #[serde(default)]
    pull_request: Option<ApiCommentHolder>,
    #[serde(default)]
    object: Option<ApiCommentHolder>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ApiConnection<T> {
    #[serde(default)]
    total_count: Option<u64>,
    nodes: Vec<Option<T>>,
    page_info: ApiPageInfo,
}

impl<T> ApiConnection<T> {
    fn into_parts(self) -> (Vec<T>, Option<u64>, PageCursor) {
        let nodes = self.nodes.into_iter().flatten().collect();
        (nodes, self.total_count, self.page_info.into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiBranchRef {
    target: Option<ApiCommitTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiCommitTarget {
    history: ApiConnection<ApiCommitNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiCommentHolder {
    comments: ApiConnection<ApiCommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiActor {
    login: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiGitActor {
    user: Option<ApiActor>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ApiIssueNode {
    id: String,
    number: u64,
    title: String,
    author: Option<ApiActor>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    url: String,
    body_text: String,
    state: String,
    comments: ApiConnection<ApiCommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ApiCommitNode {
    oid: String,
    author: Option<ApiGitActor>,
    committed_date: DateTime<Utc>,
    url: String,
    message_headline: String,
    message_body: String,
    additions: u64,
    deletions: u64,
    comments: ApiConnection<ApiCommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ApiCommentNode {
    id: String,
    author: Option<ApiActor>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    url: String,
    body_text: String,
}

impl ApiCommentNode {
    fn into_record(self, repository: &str, parent: &CommentParent) -> CommentRecord {
        CommentRecord {
            repository: repository.to_owned(),
            entity_kind: parent.kind,
            parent_entity_id: parent.entity_id.clone(),
            comment_id: self.id,
            author: self.author.map(|actor| actor.login),
            created_at: Some(self.created_at),
            updated_at: self.updated_at,
            url: self.url,
            body: self.body_text,
        }
    }
}

fn comment_records(
    connection: ApiConnection<ApiCommentNode>,
    repository: &str,
    parent: &CommentParent,
) -> (Vec<CommentRecord>, u64, PageCursor) {
    let (nodes, total_count, cursor) = connection.into_parts();
    let records: Vec<CommentRecord> = nodes
        .into_iter()
        .map(|node| node.into_record(repository, parent))
        .collect();
    let count = total_count.unwrap_or_else(|| u64::try_from(records.len()).unwrap_or(u64::MAX));
    (records, count, cursor)
}

fn issue_entity(node: ApiIssueNode, repository: &str, kind: EntityKind) -> PendingEntity {
    let parent = CommentParent {
        kind,
        entity_id: node.id.clone(),
        key: CommentParentKey::Number(node.number),
    };
    let (comments, comment_count, comments_cursor) =
        comment_records(node.comments, repository, &parent);
    PendingEntity {
        record: EntityRecord {
            repository: repository.to_owned(),
            entity_kind: kind,
            entity_id: node.id,
            number: Some(node.number),
            author: node.author.map(|actor| actor.login),
            created_at: Some(node.created_at),
            updated_at: node.updated_at,
            state: Some(node.state),
            title: node.title,
            url: node.url,
            body: node.body_text,
            additions: None,
            deletions: None,
            comment_count,
        },
        parent,
        comments,
        comments_cursor,
    }
}

fn commit_entity(node: ApiCommitNode, repository: &str) -> PendingEntity {
    let parent = CommentParent {
        kind: EntityKind::Commit,
        entity_id: node.oid.clone(),
        key: CommentParentKey::Oid(node.oid.clone()),
    };
    let (comments, comment_count, comments_cursor) =
        comment_records(node.comments, repository, &parent);
    let author = node
        .author
        .and_then(|actor| actor.user.map(|user| user.login).or(actor.name));
    PendingEntity {
        record: EntityRecord {
            repository: repository.to_owned(),
            entity_kind: EntityKind::Commit,
            entity_id: node.oid,
            number: None,
            author,
            created_at: Some(node.committed_date),
            updated_at: None,
            state: None,
            title: node.message_headline,
            url: node.url,
            body: node.message_body,
            additions: Some(node.additions),
            deletions: Some(node.deletions),
            comment_count,
        },
        parent,
        comments,
        comments_cursor,
    }
}

impl ApiData {
    fn rate_limit_info(&self) -> Option<RateLimitInfo> {
        self.rate_limit.map(RateLimitInfo::from)
    }

    fn require_repository(
        self,
        target: &RepositoryTarget,
    ) -> Result<(ApiRepository, Option<RateLimitInfo>), FetchError> {
        let rate_limit = self.rate_limit_info();
        let repository = self.repository.ok_or_else(|| FetchError::NotFound {
            message: format!("repository {target} was not returned"),
        })?;
        Ok((repository, rate_limit))
    }

    /// Converts a page of top-level entities into records.
    pub(crate) fn into_entity_page(
        self,
        operation: &str,
        target: &RepositoryTarget,
        kind: EntityKind,
    ) -> Result<EntityPage, FetchError> {
        let (repository, rate_limit) = self.require_repository(target)?;
        let slug = target.slug();

        let (entities, cursor) = match kind {
            EntityKind::Issue | EntityKind::PullRequest => {
                let connection = match kind {
                    EntityKind::Issue => repository.issues,
                    _ => repository.pull_requests,
                }
                .ok_or_else(|| FetchError::malformed(operation, "entity connection missing"))?;
                let (nodes, _, cursor) = connection.into_parts();
                let entities = nodes
                    .into_iter()
                    .map(|node| issue_entity(node, &slug, kind))
                    .collect();
                (entities, cursor)
            }
            EntityKind::Commit => match repository.default_branch_ref {
                // Empty repositories have no default branch and so no history.
                None => (Vec::new(), PageCursor::exhausted()),
                Some(branch) => {
                    let head = branch.target.ok_or_else(|| {
                        FetchError::malformed(operation, "default branch has no target")
                    })?;
                    let (nodes, _, cursor) = head.history.into_parts();
                    let entities = nodes
                        .into_iter()
                        .map(|node| commit_entity(node, &slug))
                        .collect();
                    (entities, cursor)
                }
            },
        };

        Ok(EntityPage {
            entities,
            cursor,
            rate_limit,
        })
    }

    /// Converts a page of nested comments into records.
    pub(crate) fn into_comment_page(
        self,
        operation: &str,
        target: &RepositoryTarget,
        parent: &CommentParent,
    ) -> Result<CommentPage, FetchError> {
        let (repository, rate_limit) = self.require_repository(target)?;
        let holder = match parent.kind {
            EntityKind::Issue => repository.issue,
            EntityKind::PullRequest => repository.pull_request,
            EntityKind::Commit => repository.object,
        }
        .ok_or_else(|| FetchError::NotFound {
            message: format!("{} {} was not returned", parent.kind, parent.entity_id),
        })?;
        let (comments, _, cursor) = comment_records(holder.comments, &target.slug(), parent);
        Ok(CommentPage {
            comments,
            cursor,
            rate_limit,
        })
    }

    /// Returns the standalone `rateLimit` selection.
    pub(crate) fn into_rate_limit(self, operation: &str) -> Result<RateLimitInfo, FetchError> {
        self.rate_limit_info()
            .ok_or_else(|| FetchError::malformed(operation, "rateLimit missing from response"))
    }
}
