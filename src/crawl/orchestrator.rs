//! Pair-by-pair crawl over the cross product of targets and entity kinds.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::github::locator::{RepositoryTarget, TargetList};
use crate::github::models::EntityKind;
use crate::sink::{SinkError, TableStore};
use crate::telemetry::{CrawlEvent, NoopTelemetrySink, TelemetrySink};

use super::error::{RunAborted, RunError};
use super::report::{CrawlReport, PairOutcome, PairReport};
use super::walker::EntityWalker;

type PairResult = (usize, RepositoryTarget, EntityKind, Result<PairOutcome, RunError>);

/// Drives the walker over every pair and writes the results to the store.
///
/// A pair that fails or turns out to be inaccessible is recorded and the
/// crawl moves on; only failures that would repeat for every remaining pair
/// stop the run.
#[derive(Clone)]
pub struct Orchestrator {
    walker: EntityWalker,
    store: TableStore,
    telemetry: Arc<dyn TelemetrySink>,
}

impl Orchestrator {
    /// Creates an orchestrator writing to `store`.
    #[must_use]
    pub fn new(walker: EntityWalker, store: TableStore) -> Self {
        Self {
            walker,
            store,
            telemetry: Arc::new(NoopTelemetrySink),
        }
    }

    /// Routes pair events to `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Crawls every (target, kind) pair in order, one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`RunAborted`] with the outcomes gathered so far when a
    /// run-fatal failure occurs.
    pub async fn run(
        &self,
        targets: &TargetList,
        kinds: &[EntityKind],
    ) -> Result<CrawlReport, RunAborted> {
        let mut report = CrawlReport {
            pairs: Vec::new(),
            invalid: targets.invalid.clone(),
        };

        for target in &targets.targets {
            for &kind in kinds {
                match self.crawl_pair(target, kind).await {
                    Ok(outcome) => report.record(target.clone(), kind, outcome),
                    Err(error) => {
                        if let Some(outcome) = error.pair_outcome() {
                            report.record(target.clone(), kind, outcome);
                        }
                        return Err(RunAborted {
                            report,
                            error: Box::new(error),
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    /// Crawls pairs on up to `workers` tasks sharing one rate budget.
    ///
    /// Each pair is owned by exactly one task, so every table has a single
    /// writer. The report lists pairs in input order regardless of the order
    /// in which they finished.
    ///
    /// # Errors
    ///
    /// Returns [`RunAborted`] when a run-fatal failure occurs. No new pairs
    /// start after the first such failure; pairs already in flight finish.
    pub async fn run_parallel(
        &self,
        targets: &TargetList,
        kinds: &[EntityKind],
        workers: usize,
    ) -> Result<CrawlReport, RunAborted> {
        if workers <= 1 {
            return self.run(targets, kinds).await;
        }

        let mut queue: VecDeque<(usize, RepositoryTarget, EntityKind)> = targets
            .targets
            .iter()
            .flat_map(|target| kinds.iter().map(move |&kind| (target.clone(), kind)))
            .enumerate()
            .map(|(index, (target, kind))| (index, target, kind))
            .collect();
        let mut join_set: JoinSet<PairResult> = JoinSet::new();
        let mut finished: Vec<(usize, PairReport)> = Vec::with_capacity(queue.len());
        let mut fatal: Option<RunError> = None;

        loop {
            while fatal.is_none() && join_set.len() < workers {
                let Some((index, target, kind)) = queue.pop_front() else {
                    break;
                };
                let worker = self.clone();
                join_set.spawn(async move {
                    let result = worker.crawl_pair(&target, kind).await;
                    (index, target, kind, result)
                });
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok((index, target, kind, Ok(outcome))) => {
                    finished.push((
                        index,
                        PairReport {
                            target,
                            kind,
                            outcome,
                        },
                    ));
                }
                Ok((index, target, kind, Err(error))) => {
                    if let Some(outcome) = error.pair_outcome() {
                        finished.push((
                            index,
                            PairReport {
                                target,
                                kind,
                                outcome,
                            },
                        ));
                    }
                    if fatal.is_none() {
                        fatal = Some(error);
                    }
                }
                Err(join_error) => {
                    if fatal.is_none() {
                        fatal = Some(RunError::Worker {
                            message: join_error.to_string(),
                        });
                    }
                }
            }
        }

        finished.sort_by_key(|(index, _)| *index);
        let report = CrawlReport {
            pairs: finished.into_iter().map(|(_, pair)| pair).collect(),
            invalid: targets.invalid.clone(),
        };
        if let Some(error) = fatal {
            return Err(RunAborted {
                report,
                error: Box::new(error),
            });
        }
        Ok(report)
    }

    async fn crawl_pair(
        &self,
        target: &RepositoryTarget,
        kind: EntityKind,
    ) -> Result<PairOutcome, RunError> {
        let sink_error = |source: SinkError| RunError::Sink {
            repository: target.slug(),
            entity_kind: kind,
            source,
        };

        if self.store.is_completed(target, kind).map_err(sink_error)? {
            let outcome = PairOutcome::SkippedExisting;
            self.finish(target, kind, &outcome);
            return Ok(outcome);
        }

        tracing::info!(repository = %target, entity_kind = %kind, "crawling pair");
        self.telemetry.record(CrawlEvent::PairStarted {
            repository: target.slug(),
            entity_kind: kind.as_str().to_owned(),
        });

        let mut tables = self.store.open(target, kind).map_err(sink_error)?;
        let mut walk = self.walker.walk(target.clone(), kind);
        let walked = loop {
            match walk.next_page().await {
                Ok(Some(batch)) => {
                    tables.append(&batch).map_err(sink_error)?;
                }
                Ok(None) => break Ok(()),
                Err(error) => break Err(error),
            }
        };

        let outcome = match walked {
            Ok(()) => {
                let counts = tables.close().map_err(sink_error)?;
                if counts.entities == 0 {
                    self.store.discard(target, kind).map_err(sink_error)?;
                }
                PairOutcome::Completed {
                    entities: counts.entities,
                    comments: counts.comments,
                }
            }
            Err(error) => {
                drop(tables);
                self.store.discard(target, kind).map_err(sink_error)?;
                let class = error.class();
                let message = error.to_string();
                if error.is_run_fatal() {
                    self.finish(
                        target,
                        kind,
                        &PairOutcome::Failed {
                            class,
                            message: message.clone(),
                        },
                    );
                    return Err(RunError::Fatal {
                        repository: target.slug(),
                        entity_kind: kind,
                        class,
                        message,
                    });
                }
                if error.is_inaccessible() {
                    PairOutcome::SkippedInaccessible { reason: message }
                } else {
                    PairOutcome::Failed { class, message }
                }
            }
        };

        self.finish(target, kind, &outcome);
        Ok(outcome)
    }

    fn finish(&self, target: &RepositoryTarget, kind: EntityKind, outcome: &PairOutcome) {
        if matches!(outcome, PairOutcome::Failed { .. }) {
            tracing::warn!(repository = %target, entity_kind = %kind, "pair {outcome}");
        } else {
            tracing::info!(repository = %target, entity_kind = %kind, "pair {outcome}");
        }
        self.telemetry.record(CrawlEvent::PairFinished {
            repository: target.slug(),
            entity_kind: kind.as_str().to_owned(),
            outcome: outcome.label().to_owned(),
        });
    }
}
