//! Scripted gateway and record builders shared by crawl tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::github::error::FetchError;
use crate::github::gateway::CrawlGateway;
use crate::github::models::{
    CommentPage, CommentParent, CommentParentKey, CommentRecord, EntityKind, EntityPage,
    EntityRecord, PendingEntity,
};
use crate::github::pagination::PageCursor;
use crate::github::query::{CommentPageRequest, EntityPageRequest};
use crate::github::rate_limit::RateLimitInfo;

pub(crate) const REPOSITORY: &str = "octocat/hello-world";

type Script<T> = VecDeque<Result<T, FetchError>>;

/// Gateway that replays canned responses keyed by cursor.
///
/// Each key holds a queue; responses are popped in order and the last one
/// repeats once the queue is down to a single entry.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    entity_pages: Mutex<HashMap<Option<String>, Script<EntityPage>>>,
    comment_pages: Mutex<HashMap<(String, Option<String>), Script<CommentPage>>>,
    entity_calls: AtomicUsize,
    comment_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn on_entity_page(
        self,
        after: Option<&str>,
        response: Result<EntityPage, FetchError>,
    ) -> Self {
        self.entity_pages
            .lock()
            .expect("script mutex should be available")
            .entry(after.map(ToOwned::to_owned))
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn on_comment_page(
        self,
        parent_id: &str,
        after: Option<&str>,
        response: Result<CommentPage, FetchError>,
    ) -> Self {
        self.comment_pages
            .lock()
            .expect("script mutex should be available")
            .entry((parent_id.to_owned(), after.map(ToOwned::to_owned)))
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn entity_calls(&self) -> usize {
        self.entity_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn comment_calls(&self) -> usize {
        self.comment_calls.load(Ordering::SeqCst)
    }
}

fn next_response<T: Clone>(script: Option<&mut Script<T>>, what: &str) -> Result<T, FetchError> {
    let Some(queue) = script else {
        panic!("no scripted response for {what}");
    };
    if queue.len() > 1 {
        queue.pop_front().expect("queue is non-empty")
    } else {
        queue.front().cloned().expect("queue is non-empty")
    }
}

#[async_trait]
impl CrawlGateway for ScriptedGateway {
    async fn entity_page(&self, request: &EntityPageRequest) -> Result<EntityPage, FetchError> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        let mut pages = self
            .entity_pages
            .lock()
            .expect("script mutex should be available");
        next_response(
            pages.get_mut(&request.after),
            &format!("entity page after {:?}", request.after),
        )
    }

    async fn comment_page(
        &self,
        request: &CommentPageRequest,
    ) -> Result<CommentPage, FetchError> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        let key = (request.parent.entity_id.clone(), request.after.clone());
        let mut pages = self
            .comment_pages
            .lock()
            .expect("script mutex should be available");
        next_response(pages.get_mut(&key), &format!("comment page {key:?}"))
    }

    async fn rate_limit(&self) -> Result<RateLimitInfo, FetchError> {
        Ok(RateLimitInfo::new(5000, 5000, None))
    }
}

pub(crate) fn comment(parent_id: &str, index: u32) -> CommentRecord {
    CommentRecord {
        repository: REPOSITORY.to_owned(),
        entity_kind: EntityKind::Issue,
        parent_entity_id: parent_id.to_owned(),
        comment_id: format!("{parent_id}_C{index}"),
        author: Some("hubot".to_owned()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, index).single(),
        updated_at: None,
        url: format!("https://github.com/{REPOSITORY}/issues#c{index}"),
        body: format!("comment {index}\nsorry about that"),
    }
}

/// Issue `number` with id `I_<number>` and the given inline comments.
pub(crate) fn issue(
    number: u64,
    comments: Vec<CommentRecord>,
    comments_cursor: PageCursor,
    comment_count: u64,
) -> PendingEntity {
    let entity_id = format!("I_{number}");
    PendingEntity {
        record: EntityRecord {
            repository: REPOSITORY.to_owned(),
            entity_kind: EntityKind::Issue,
            entity_id: entity_id.clone(),
            number: Some(number),
            author: Some("octocat".to_owned()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single(),
            updated_at: None,
            state: Some("OPEN".to_owned()),
            title: format!("Issue {number}"),
            url: format!("https://github.com/{REPOSITORY}/issues/{number}"),
            body: "it broke".to_owned(),
            additions: None,
            deletions: None,
            comment_count,
        },
        parent: CommentParent {
            kind: EntityKind::Issue,
            entity_id,
            key: CommentParentKey::Number(number),
        },
        comments,
        comments_cursor,
    }
}

/// Issue without comments.
pub(crate) fn bare_issue(number: u64) -> PendingEntity {
    issue(number, Vec::new(), PageCursor::exhausted(), 0)
}

pub(crate) fn entity_page(
    entities: Vec<PendingEntity>,
    end_cursor: Option<&str>,
    has_next: bool,
) -> EntityPage {
    EntityPage {
        entities,
        cursor: PageCursor::new(end_cursor.map(ToOwned::to_owned), has_next),
        rate_limit: Some(RateLimitInfo::new(5000, 4900, None).with_cost(Some(1))),
    }
}

pub(crate) fn comment_page(
    comments: Vec<CommentRecord>,
    end_cursor: Option<&str>,
    has_next: bool,
) -> CommentPage {
    CommentPage {
        comments,
        cursor: PageCursor::new(end_cursor.map(ToOwned::to_owned), has_next),
        rate_limit: Some(RateLimitInfo::new(5000, 4899, None).with_cost(Some(1))),
    }
}

pub(crate) fn transient() -> FetchError {
    FetchError::Transient {
        operation: "IssuePage".to_owned(),
        message: "502 Bad Gateway".to_owned(),
    }
}

/// The end-to-end scenario: two single-issue pages, the second issue with
/// two comments split across two comment pages.
pub(crate) fn two_issue_script() -> ScriptedGateway {
    ScriptedGateway::default()
        .on_entity_page(None, Ok(entity_page(vec![bare_issue(1)], Some("p1"), true)))
        .on_entity_page(
            Some("p1"),
            Ok(entity_page(
                vec![issue(
                    2,
                    vec![comment("I_2", 1)],
                    PageCursor::new(Some("c1".to_owned()), true),
                    2,
                )],
                Some("p2"),
                false,
            )),
        )
        .on_comment_page(
            "I_2",
            Some("c1"),
            Ok(comment_page(vec![comment("I_2", 2)], Some("c2"), false)),
        )
}

/// Issue 2 on the second page loses its follow-up comment page to `failure`.
pub(crate) fn vanished_entity_script(failure: FetchError) -> ScriptedGateway {
    ScriptedGateway::default()
        .on_entity_page(None, Ok(entity_page(vec![bare_issue(1)], Some("p1"), true)))
        .on_entity_page(
            Some("p1"),
            Ok(entity_page(
                vec![issue(
                    2,
                    vec![comment("I_2", 1)],
                    PageCursor::new(Some("c1".to_owned()), true),
                    2,
                )],
                None,
                false,
            )),
        )
        .on_comment_page("I_2", Some("c1"), Err(failure))
}
