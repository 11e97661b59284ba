//! Devtalk library crate for harvesting developer-authored text from GitHub.
//!
//! The library walks GitHub's GraphQL API for issues, pull requests, and
//! commits together with their comments, gates every query on the shared
//! point budget, and appends flattened rows to per-repository CSV tables so
//! that a crawl interrupted at any point can be resumed pair by pair.

pub mod config;
pub mod crawl;
pub mod error;
pub mod github;
pub mod sink;
pub mod telemetry;

pub use config::{DevtalkConfig, OperationMode};
pub use crawl::{
    CrawlReport, EntityWalker, Orchestrator, PairOutcome, QueryExecutor, RateBudget, RetryConfig,
    RunAborted, WalkSettings,
};
pub use error::DevtalkError;
pub use github::{
    CommentRecord, CrawlGateway, EntityKind, EntityRecord, FailureClass, FetchError,
    OctocrabCrawlGateway, PersonalAccessToken, RateLimitInfo, RepositoryTarget, TargetError,
    TargetList,
};
pub use sink::{SinkError, TableStore};
