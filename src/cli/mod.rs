//! Command handlers for the `devtalk` binary.
//!
//! - [`download`]: crawl the configured repositories
//! - [`delete`]: remove tables for the selected data types
//! - [`rate_limit`]: show the token's GraphQL rate limit
//! - [`info`]: summarise tables on disk
//!
//! Output formatting lives in [`output`].

pub mod delete;
pub mod download;
pub mod info;
pub mod output;
pub mod rate_limit;
