//! Nested pagination over one (repository, entity kind) pair.
//!
//! An [`EntityWalk`] pulls top-level pages on demand. Before a page is handed
//! back, every entity on it has its comment connection drained, so consumers
//! never see an entity whose comments are still in flight. Walks restart only
//! from the beginning: cursors live in memory for the duration of one walk.

use std::sync::Arc;

use crate::github::error::FetchError;
use crate::github::locator::RepositoryTarget;
use crate::github::models::{CommentedEntity, EntityKind, PendingEntity};
use crate::github::pagination::PageCursor;
use crate::github::query::{CommentPageRequest, EntityPageRequest};
use crate::github::rate_limit::RateLimitInfo;
use crate::telemetry::{CrawlEvent, NoopTelemetrySink, TelemetrySink};

use super::error::WalkError;
use super::executor::QueryExecutor;
use super::retry::{RetryConfig, with_retry};

/// Default entities per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Default comments per page.
pub const DEFAULT_COMMENT_PAGE_SIZE: u32 = 50;

/// Page sizes, caps, and retry policy for a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSettings {
    /// Entities per page (GitHub allows 1-100).
    pub page_size: u32,
    /// Comments per page, inline and follow-up (1-100).
    pub comment_page_size: u32,
    /// Maximum top-level pages per pair; `None` walks to the end.
    pub max_pages: Option<usize>,
    /// Maximum follow-up comment pages per entity; `None` drains fully.
    pub max_comment_pages: Option<usize>,
    /// Backoff policy for transient failures.
    pub retry: RetryConfig,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            comment_page_size: DEFAULT_COMMENT_PAGE_SIZE,
            max_pages: None,
            max_comment_pages: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Drives [`QueryExecutor`] across the pages of a pair.
#[derive(Clone)]
pub struct EntityWalker {
    executor: QueryExecutor,
    settings: WalkSettings,
    telemetry: Arc<dyn TelemetrySink>,
}

impl EntityWalker {
    /// Creates a walker with the given settings.
    #[must_use]
    pub fn new(executor: QueryExecutor, settings: WalkSettings) -> Self {
        Self {
            executor,
            settings,
            telemetry: Arc::new(NoopTelemetrySink),
        }
    }

    /// Routes page and retry events to `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Starts a walk over `kind` entities of `target`.
    #[must_use]
    pub const fn walk(&self, target: RepositoryTarget, kind: EntityKind) -> EntityWalk<'_> {
        EntityWalk {
            walker: self,
            target,
            kind,
            cursor: PageCursor::start(),
            pages: 0,
        }
    }

    async fn drain_comments(
        &self,
        target: &RepositoryTarget,
        pending: PendingEntity,
    ) -> Result<CommentedEntity, WalkError> {
        let PendingEntity {
            record,
            parent,
            mut comments,
            comments_cursor,
        } = pending;
        let mut cursor = comments_cursor;
        let mut pages: usize = 0;

        while cursor.has_next() {
            if let Some(cap) = self.settings.max_comment_pages
                && pages >= cap
            {
                return Err(WalkError::PageCapExceeded {
                    cap,
                    connection: "comment",
                });
            }

            let request = CommentPageRequest {
                target: target.clone(),
                parent: parent.clone(),
                after: cursor.after().map(ToOwned::to_owned),
                page_size: self.settings.comment_page_size,
            };
            let operation = request.operation();
            if cursor.is_stuck() {
                return Err(stuck_cursor(operation));
            }

            let page = with_retry(
                &self.settings.retry,
                self.executor.budget(),
                request.shape(),
                operation,
                self.telemetry.as_ref(),
                || self.executor.fetch_comments(&request),
            )
            .await
            .map_err(|error| entity_scoped(error, &parent.entity_id))?;
            pages = pages.saturating_add(1);

            if !advanced(&page.cursor, request.after.as_deref()) {
                return Err(stuck_cursor(operation));
            }
            self.page_fetched(target, operation, page.comments.len(), page.rate_limit);
            comments.extend(page.comments);
            cursor = page.cursor;
        }

        Ok(CommentedEntity {
            entity: record,
            comments,
        })
    }

    fn page_fetched(
        &self,
        target: &RepositoryTarget,
        operation: &str,
        rows: usize,
        rate_limit: Option<RateLimitInfo>,
    ) {
        let remaining = rate_limit.map(|info| info.remaining());
        tracing::debug!(
            repository = %target,
            operation,
            rows,
            remaining,
            "fetched page"
        );
        self.telemetry.record(CrawlEvent::PageFetched {
            repository: target.slug(),
            operation: operation.to_owned(),
            rows,
            remaining,
        });
    }
}

/// Lazy, finite sequence of fully commented entities for one pair.
pub struct EntityWalk<'a> {
    walker: &'a EntityWalker,
    target: RepositoryTarget,
    kind: EntityKind,
    cursor: PageCursor,
    pages: usize,
}

impl EntityWalk<'_> {
    /// Fetches the next page and drains its entities' comments.
    ///
    /// Returns `Ok(None)` once GitHub reports no further pages.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError`] when a request fails permanently, transient
    /// failures outlast the retry budget, a cursor stops advancing, or a page
    /// cap is reached.
    pub async fn next_page(&mut self) -> Result<Option<Vec<CommentedEntity>>, WalkError> {
        if !self.cursor.has_next() {
            return Ok(None);
        }
        let settings = &self.walker.settings;
        if let Some(cap) = settings.max_pages
            && self.pages >= cap
        {
            return Err(WalkError::PageCapExceeded {
                cap,
                connection: "entity",
            });
        }

        let request = EntityPageRequest {
            target: self.target.clone(),
            kind: self.kind,
            after: self.cursor.after().map(ToOwned::to_owned),
            page_size: settings.page_size,
            comment_page_size: settings.comment_page_size,
        };
        let operation = request.operation();
        let executor = &self.walker.executor;
        let page = with_retry(
            &settings.retry,
            executor.budget(),
            request.shape(),
            operation,
            self.walker.telemetry.as_ref(),
            || executor.fetch_page(&request),
        )
        .await?;
        self.pages = self.pages.saturating_add(1);

        if !advanced(&page.cursor, request.after.as_deref()) {
            return Err(stuck_cursor(operation));
        }
        self.walker
            .page_fetched(&self.target, operation, page.entities.len(), page.rate_limit);

        let mut batch = Vec::with_capacity(page.entities.len());
        for pending in page.entities {
            batch.push(self.walker.drain_comments(&self.target, pending).await?);
        }
        self.cursor = page.cursor;
        Ok(Some(batch))
    }
}

/// A page that claims more data must hand back a new, present cursor.
fn advanced(cursor: &PageCursor, previous: Option<&str>) -> bool {
    if cursor.is_last_page() {
        return true;
    }
    !cursor.is_stuck() && cursor.after() != previous
}

/// Comment pages address one entity, so "not found" there means the entity
/// went away, not the repository.
fn entity_scoped(error: WalkError, entity_id: &str) -> WalkError {
    match error {
        WalkError::Fetch(source) if source.is_inaccessible() => {
            tracing::warn!(entity_id, "entity vanished mid-walk: {source}");
            WalkError::EntityVanished(source)
        }
        other => other,
    }
}

fn stuck_cursor(operation: &str) -> WalkError {
    WalkError::Fetch(FetchError::malformed(
        operation,
        "hasNextPage is true but the cursor did not advance",
    ))
}

#[cfg(test)]
mod tests;
