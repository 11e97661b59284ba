//! Aggregate outcome of a crawl.

use std::fmt;

use crate::github::error::FailureClass;
use crate::github::locator::{InvalidTarget, RepositoryTarget};
use crate::github::models::EntityKind;

/// Final state of one (repository, entity kind) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// The pair was walked to the end and its rows written.
    Completed {
        /// Entity rows written.
        entities: u64,
        /// Comment rows written.
        comments: u64,
    },
    /// A non-empty table already existed, so nothing was fetched.
    SkippedExisting,
    /// The repository was not found or not visible to the token.
    SkippedInaccessible {
        /// Message GitHub returned.
        reason: String,
    },
    /// The pair failed; a re-run will fetch it again from the start.
    Failed {
        /// Class of the last error.
        class: FailureClass,
        /// Last error message.
        message: String,
    },
}

impl PairOutcome {
    /// Snake-case label used in logs and telemetry.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::SkippedExisting => "skipped_existing",
            Self::SkippedInaccessible { .. } => "skipped_inaccessible",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for PairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { entities, comments } => {
                write!(f, "completed ({entities} entities, {comments} comments)")
            }
            Self::SkippedExisting => f.write_str("skipped (table already complete)"),
            Self::SkippedInaccessible { reason } => write!(f, "skipped (inaccessible: {reason})"),
            Self::Failed { class, message } => write!(f, "failed [{class}]: {message}"),
        }
    }
}

/// Outcome of one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReport {
    /// Repository crawled.
    pub target: RepositoryTarget,
    /// Entity kind crawled.
    pub kind: EntityKind,
    /// How the pair ended.
    pub outcome: PairOutcome,
}

/// Per-pair outcomes of a crawl plus the inputs rejected before it started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pair outcomes in input order.
    pub pairs: Vec<PairReport>,
    /// Repository list entries rejected before any network call.
    pub invalid: Vec<InvalidTarget>,
}

impl CrawlReport {
    /// Appends the outcome of a pair.
    pub fn record(&mut self, target: RepositoryTarget, kind: EntityKind, outcome: PairOutcome) {
        self.pairs.push(PairReport {
            target,
            kind,
            outcome,
        });
    }

    fn count(&self, predicate: impl Fn(&PairOutcome) -> bool) -> usize {
        self.pairs
            .iter()
            .filter(|pair| predicate(&pair.outcome))
            .count()
    }

    /// Pairs walked to completion.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(|outcome| matches!(outcome, PairOutcome::Completed { .. }))
    }

    /// Pairs skipped because their table already held data.
    #[must_use]
    pub fn skipped_existing(&self) -> usize {
        self.count(|outcome| matches!(outcome, PairOutcome::SkippedExisting))
    }

    /// Pairs skipped because the repository was inaccessible.
    #[must_use]
    pub fn skipped_inaccessible(&self) -> usize {
        self.count(|outcome| matches!(outcome, PairOutcome::SkippedInaccessible { .. }))
    }

    /// Pairs that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, PairOutcome::Failed { .. }))
    }

    /// Entity and comment rows written across all completed pairs.
    #[must_use]
    pub fn rows_written(&self) -> (u64, u64) {
        self.pairs
            .iter()
            .fold((0, 0), |(entities, comments), pair| match pair.outcome {
                PairOutcome::Completed {
                    entities: written,
                    comments: attached,
                } => (entities.saturating_add(written), comments.saturating_add(attached)),
                _ => (entities, comments),
            })
    }

    /// Repositories with at least one failed pair, for a targeted re-run.
    #[must_use]
    pub fn failed_targets(&self) -> Vec<&RepositoryTarget> {
        let mut targets: Vec<&RepositoryTarget> = Vec::new();
        for pair in &self.pairs {
            if matches!(pair.outcome, PairOutcome::Failed { .. }) && !targets.contains(&&pair.target)
            {
                targets.push(&pair.target);
            }
        }
        targets
    }

    /// True when no pair failed. Skipped pairs do not count as failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::{CrawlReport, PairOutcome};
    use crate::github::error::FailureClass;
    use crate::github::locator::RepositoryTarget;
    use crate::github::models::EntityKind;

    fn target(slug: &str) -> RepositoryTarget {
        RepositoryTarget::parse(slug).expect("valid target")
    }

    #[fixture]
    fn report() -> CrawlReport {
        let mut report = CrawlReport::default();
        report.record(
            target("octo/one"),
            EntityKind::Issue,
            PairOutcome::Completed {
                entities: 4,
                comments: 9,
            },
        );
        report.record(
            target("octo/one"),
            EntityKind::Commit,
            PairOutcome::Failed {
                class: FailureClass::Transient,
                message: "502".to_owned(),
            },
        );
        report.record(
            target("octo/one"),
            EntityKind::PullRequest,
            PairOutcome::Failed {
                class: FailureClass::Malformed,
                message: "schema".to_owned(),
            },
        );
        report.record(
            target("octo/gone"),
            EntityKind::Issue,
            PairOutcome::SkippedInaccessible {
                reason: "not found".to_owned(),
            },
        );
        report.record(target("octo/two"), EntityKind::Issue, PairOutcome::SkippedExisting);
        report
    }

    #[rstest]
    fn counts_each_outcome(report: CrawlReport) {
        assert_eq!(report.completed(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.skipped_inaccessible(), 1);
        assert_eq!(report.skipped_existing(), 1);
        assert_eq!(report.rows_written(), (4, 9));
        assert!(!report.is_success());
    }

    #[rstest]
    fn failed_targets_are_deduplicated(report: CrawlReport) {
        let slugs: Vec<String> = report
            .failed_targets()
            .into_iter()
            .map(RepositoryTarget::slug)
            .collect();
        assert_eq!(slugs, vec!["octo/one"]);
    }

    #[rstest]
    fn skips_alone_are_success() {
        let mut report = CrawlReport::default();
        report.record(
            target("octo/gone"),
            EntityKind::Issue,
            PairOutcome::SkippedInaccessible {
                reason: "forbidden".to_owned(),
            },
        );
        assert!(report.is_success());
    }
}
