//! Crawl engine: rate budgeting, retries, nested pagination, and the
//! pair-by-pair orchestration that makes runs resumable.

pub mod budget;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod walker;

#[cfg(test)]
pub(crate) mod test_support;

pub use budget::{BudgetSettings, Clock, DEFAULT_SAFETY_MARGIN, RateBudget, SystemClock};
pub use error::{RunAborted, RunError, WalkError};
pub use executor::QueryExecutor;
pub use orchestrator::Orchestrator;
pub use report::{CrawlReport, PairOutcome, PairReport};
pub use retry::RetryConfig;
pub use walker::{
    DEFAULT_COMMENT_PAGE_SIZE, DEFAULT_PAGE_SIZE, EntityWalk, EntityWalker, WalkSettings,
};
