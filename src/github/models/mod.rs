//! Flattened entity and comment records produced by the crawler.
//!
//! Records are the rows written to the output tables. The GraphQL response
//! schema they are decoded from lives in the private `api` module; decoding
//! is strict, so a response that does not match the schema surfaces as
//! [`FetchError::Malformed`](crate::github::FetchError::Malformed) instead of
//! yielding partially populated rows.

pub(crate) mod api;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::pagination::PageCursor;
use super::rate_limit::RateLimitInfo;

/// Top-level object type being crawled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Repository issues.
    Issue,
    /// Repository pull requests.
    PullRequest,
    /// Commits on the default branch.
    Commit,
}

impl EntityKind {
    /// Every entity kind, in crawl order.
    pub const ALL: [Self; 3] = [Self::Issue, Self::PullRequest, Self::Commit];

    /// Label written to the `entity_kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull_request",
            Self::Commit => "commit",
        }
    }

    /// Directory under the output root that holds this kind's tables.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Issue => "issues",
            Self::PullRequest => "pull_requests",
            Self::Commit => "commits",
        }
    }

    /// Parses a data type selector: `all`, or a comma separated list of kinds.
    ///
    /// Duplicates are collapsed and the result follows [`EntityKind::ALL`]
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntityKind`] for any unrecognised entry, including an
    /// empty selector.
    ///
    /// # Example
    ///
    /// ```
    /// use devtalk::EntityKind;
    ///
    /// let kinds = EntityKind::parse_selection("commits, issues").expect("valid selector");
    /// assert_eq!(kinds, vec![EntityKind::Issue, EntityKind::Commit]);
    /// assert_eq!(EntityKind::parse_selection("all").expect("valid").len(), 3);
    /// ```
    pub fn parse_selection(selector: &str) -> Result<Vec<Self>, UnknownEntityKind> {
        let mut selected = Vec::new();
        for entry in selector.split(',').map(str::trim) {
            if entry.eq_ignore_ascii_case("all") {
                return Ok(Self::ALL.to_vec());
            }
            let kind = entry.parse::<Self>()?;
            if !selected.contains(&kind) {
                selected.push(kind);
            }
        }
        selected.sort_unstable();
        Ok(selected)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an entity kind name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown data type `{0}`; expected issues, pull_requests, commits, or all")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "issue" | "issues" => Ok(Self::Issue),
            "pull_request" | "pull_requests" | "pull-requests" | "pulls" | "prs" => {
                Ok(Self::PullRequest)
            }
            "commit" | "commits" => Ok(Self::Commit),
            _ => Err(UnknownEntityKind(value.to_owned())),
        }
    }
}

/// One issue, pull request, or commit, flattened into a table row.
///
/// Field order is the column order of the entity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    /// `owner/name` of the repository.
    pub repository: String,
    /// Kind of entity.
    pub entity_kind: EntityKind,
    /// GraphQL node id for issues and pull requests, commit SHA for commits.
    pub entity_id: String,
    /// Issue or pull request number.
    pub number: Option<u64>,
    /// Login of the author; empty for deleted accounts.
    pub author: Option<String>,
    /// Creation (or commit) timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// `OPEN`, `CLOSED`, or `MERGED`; empty for commits.
    pub state: Option<String>,
    /// Title, or the commit message headline.
    pub title: String,
    /// Browser URL.
    pub url: String,
    /// Plain-text body, or the commit message body.
    pub body: String,
    /// Lines added by a commit.
    pub additions: Option<u64>,
    /// Lines deleted by a commit.
    pub deletions: Option<u64>,
    /// Total comments GitHub reports for the entity.
    pub comment_count: u64,
}

/// One comment, keyed by its parent entity.
///
/// Field order is the column order of the comment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    /// `owner/name` of the repository.
    pub repository: String,
    /// Kind of the parent entity.
    pub entity_kind: EntityKind,
    /// `entity_id` of the parent row.
    pub parent_entity_id: String,
    /// GraphQL node id of the comment.
    pub comment_id: String,
    /// Login of the author; empty for deleted accounts.
    pub author: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Browser URL.
    pub url: String,
    /// Plain-text body.
    pub body: String,
}

/// How the nested comment query addresses a parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommentParentKey {
    /// Issue or pull request number.
    Number(u64),
    /// Commit SHA.
    Oid(String),
}

/// Parent entity whose comment connection is being drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentParent {
    /// Kind of the parent.
    pub kind: EntityKind,
    /// Row id of the parent, copied into every comment row.
    pub entity_id: String,
    /// Lookup key used by the nested query.
    pub key: CommentParentKey,
}

/// Entity decoded from a page together with the first page of its comments.
///
/// The walker drains `comments_cursor` before releasing the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntity {
    /// The entity row.
    pub record: EntityRecord,
    /// Address for follow-up comment pages.
    pub parent: CommentParent,
    /// Comments received so far.
    pub comments: Vec<CommentRecord>,
    /// Position within the entity's comment connection.
    pub comments_cursor: PageCursor,
}

/// Decoded page of top-level entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPage {
    /// Entities in API order.
    pub entities: Vec<PendingEntity>,
    /// Position after this page.
    pub cursor: PageCursor,
    /// Budget snapshot reported with the page.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Decoded page of comments for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPage {
    /// Comments in API order.
    pub comments: Vec<CommentRecord>,
    /// Position after this page.
    pub cursor: PageCursor,
    /// Budget snapshot reported with the page.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Entity with its complete comment set, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentedEntity {
    /// The entity row.
    pub entity: EntityRecord,
    /// Every comment of the entity, in API order.
    pub comments: Vec<CommentRecord>,
}

impl CommentedEntity {
    /// Repository slug shared by all rows.
    #[must_use]
    pub fn repository(&self) -> &str {
        self.entity.repository.as_str()
    }
}
