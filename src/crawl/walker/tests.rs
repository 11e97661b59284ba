//! Tests for the entity walker.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use super::{EntityWalker, WalkSettings};
use crate::crawl::budget::{BudgetSettings, RateBudget};
use crate::crawl::error::WalkError;
use crate::crawl::executor::QueryExecutor;
use crate::crawl::retry::RetryConfig;
use crate::crawl::test_support::{
    ScriptedGateway, bare_issue, comment, comment_page, entity_page, issue, transient,
    two_issue_script, vanished_entity_script,
};
use crate::github::error::{FailureClass, FetchError};
use crate::github::locator::RepositoryTarget;
use crate::github::models::{CommentedEntity, EntityKind, EntityPage};
use crate::github::pagination::PageCursor;

fn settings() -> WalkSettings {
    WalkSettings {
        page_size: 1,
        comment_page_size: 1,
        max_pages: Some(20),
        max_comment_pages: Some(20),
        retry: RetryConfig::new(Duration::from_millis(10), Duration::from_millis(100), 3)
            .with_jitter(false),
    }
}

fn walker(gateway: &Arc<ScriptedGateway>, settings: WalkSettings) -> EntityWalker {
    let budget = RateBudget::new(BudgetSettings::default());
    EntityWalker::new(QueryExecutor::new(gateway.clone(), budget), settings)
}

fn target() -> RepositoryTarget {
    RepositoryTarget::from_owner_repo("octocat", "hello-world").expect("valid target")
}

async fn collect(walker: &EntityWalker) -> Result<Vec<CommentedEntity>, WalkError> {
    let mut walk = walker.walk(target(), EntityKind::Issue);
    let mut all = Vec::new();
    while let Some(batch) = walk.next_page().await? {
        all.extend(batch);
    }
    Ok(all)
}

#[tokio::test(start_paused = true)]
async fn drains_nested_comments_before_emitting_entities() {
    let gateway = Arc::new(two_issue_script());
    let walker = walker(&gateway, settings());

    let mut walk = walker.walk(target(), EntityKind::Issue);
    let first = walk.next_page().await.expect("first page").expect("has page");
    let second = walk.next_page().await.expect("second page").expect("has page");
    let end = walk.next_page().await.expect("end of walk");

    assert!(end.is_none(), "walk must terminate once has-next is false");
    let first_entity = first.first().expect("issue 1");
    assert_eq!(first_entity.entity.entity_id, "I_1");
    assert!(first_entity.comments.is_empty());

    let second_entity = second.first().expect("issue 2");
    let comment_ids: Vec<&str> = second_entity
        .comments
        .iter()
        .map(|record| record.comment_id.as_str())
        .collect();
    assert_eq!(comment_ids, vec!["I_2_C1", "I_2_C2"]);
    assert!(
        second_entity
            .comments
            .iter()
            .all(|record| record.parent_entity_id == "I_2")
    );
    assert_eq!(gateway.entity_calls(), 2);
    assert_eq!(gateway.comment_calls(), 1);
}

#[rstest]
#[case::first_page(None)]
#[case::second_page(Some("p1"))]
#[tokio::test(start_paused = true)]
async fn transient_failure_recovers_with_identical_rows(#[case] failing: Option<&'static str>) {
    let clean = Arc::new(two_issue_script());
    let expected = collect(&walker(&clean, settings()))
        .await
        .expect("fault-free walk");

    // The failing key answers with one transient error before its page.
    let faulty = Arc::new(
        ScriptedGateway::default()
            .on_entity_page(failing, Err(transient()))
            .on_entity_page(None, Ok(entity_page(vec![bare_issue(1)], Some("p1"), true)))
            .on_entity_page(Some("p1"), Ok(second_page()))
            .on_comment_page(
                "I_2",
                Some("c1"),
                Ok(comment_page(vec![comment("I_2", 2)], Some("c2"), false)),
            ),
    );

    let recovered = collect(&walker(&faulty, settings()))
        .await
        .expect("walk should recover");

    assert_eq!(recovered, expected, "no duplicates and no gaps");
    assert_eq!(faulty.entity_calls(), 3);
}

fn second_page() -> EntityPage {
    entity_page(
        vec![issue(
            2,
            vec![comment("I_2", 1)],
            PageCursor::new(Some("c1".to_owned()), true),
            2,
        )],
        Some("p2"),
        false,
    )
}

#[tokio::test(start_paused = true)]
async fn endless_pagination_is_bounded_by_page_cap() {
    let mut scripted = ScriptedGateway::default();
    scripted = scripted.on_entity_page(None, Ok(entity_page(vec![bare_issue(0)], Some("p0"), true)));
    for page in 0..10_u64 {
        let after = format!("p{page}");
        let next = format!("p{}", page + 1);
        scripted = scripted.on_entity_page(
            Some(&after),
            Ok(entity_page(vec![bare_issue(page + 1)], Some(&next), true)),
        );
    }
    let gateway = Arc::new(scripted);
    let walker = walker(
        &gateway,
        WalkSettings {
            max_pages: Some(3),
            ..settings()
        },
    );

    let result = collect(&walker).await;

    assert_eq!(
        result,
        Err(WalkError::PageCapExceeded {
            cap: 3,
            connection: "entity",
        })
    );
    assert_eq!(gateway.entity_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn comment_pagination_is_bounded_by_its_cap() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .on_entity_page(
                None,
                Ok(entity_page(
                    vec![issue(
                        9,
                        Vec::new(),
                        PageCursor::new(Some("c0".to_owned()), true),
                        100,
                    )],
                    None,
                    false,
                )),
            )
            .on_comment_page(
                "I_9",
                Some("c0"),
                Ok(comment_page(
                    vec![comment("I_9", 1)],
                    Some("c1"),
                    true,
                )),
            )
            .on_comment_page(
                "I_9",
                Some("c1"),
                Ok(comment_page(
                    vec![comment("I_9", 2)],
                    Some("c2"),
                    true,
                )),
            ),
    );
    let walker = walker(
        &gateway,
        WalkSettings {
            max_comment_pages: Some(2),
            ..settings()
        },
    );

    let result = collect(&walker).await;

    assert_eq!(
        result,
        Err(WalkError::PageCapExceeded {
            cap: 2,
            connection: "comment",
        })
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_cursor_is_malformed() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .on_entity_page(None, Ok(entity_page(vec![bare_issue(1)], Some("p1"), true)))
            .on_entity_page(Some("p1"), Ok(entity_page(vec![bare_issue(2)], Some("p1"), true))),
    );

    let error = collect(&walker(&gateway, settings()))
        .await
        .expect_err("walk should stop");

    assert_eq!(error.class(), FailureClass::Malformed);
    assert_eq!(gateway.entity_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn missing_cursor_with_more_pages_is_malformed() {
    let gateway = Arc::new(
        ScriptedGateway::default()
            .on_entity_page(None, Ok(entity_page(vec![bare_issue(1)], None, true))),
    );

    let error = collect(&walker(&gateway, settings()))
        .await
        .expect_err("walk should stop");

    assert_eq!(error.class(), FailureClass::Malformed);
}

#[tokio::test(start_paused = true)]
async fn inaccessible_repository_stops_without_retry() {
    let gateway = Arc::new(ScriptedGateway::default().on_entity_page(
        None,
        Err(FetchError::NotFound {
            message: "Could not resolve to a Repository".to_owned(),
        }),
    ));

    let error = collect(&walker(&gateway, settings()))
        .await
        .expect_err("walk should stop");

    assert!(error.is_inaccessible());
    assert_eq!(gateway.entity_calls(), 1);
}

#[rstest]
#[case::not_found(FetchError::NotFound {
    message: "issue I_2 was not returned".to_owned(),
})]
#[case::forbidden(FetchError::Forbidden {
    message: "Resource not accessible by integration".to_owned(),
})]
#[tokio::test(start_paused = true)]
async fn vanished_entity_fails_the_walk_instead_of_skipping(#[case] failure: FetchError) {
    let gateway = Arc::new(vanished_entity_script(failure.clone()));

    let error = collect(&walker(&gateway, settings()))
        .await
        .expect_err("walk should stop");

    assert_eq!(error, WalkError::EntityVanished(failure.clone()));
    assert!(!error.is_inaccessible());
    assert!(!error.is_run_fatal());
    assert_eq!(error.class(), failure.class());
    assert_eq!(gateway.comment_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn persistent_transient_failure_exhausts_retries() {
    let gateway = Arc::new(ScriptedGateway::default().on_entity_page(None, Err(transient())));

    let error = collect(&walker(&gateway, settings()))
        .await
        .expect_err("walk should give up");

    assert!(matches!(
        error,
        WalkError::RetriesExhausted { attempts: 4, .. }
    ));
    assert_eq!(error.class(), FailureClass::Transient);
}
