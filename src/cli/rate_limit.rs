//! The `--rate-limit` command.

use std::io;

use chrono::Utc;
use devtalk::{CrawlGateway, DevtalkConfig, DevtalkError, OctocrabCrawlGateway};

use super::output::write_rate_limit;

/// Queries and prints the token's current GraphQL rate limit.
///
/// # Errors
///
/// Returns [`DevtalkError`] when no token is configured, the request fails,
/// or the output cannot be written.
pub async fn run(config: &DevtalkConfig) -> Result<(), DevtalkError> {
    let token = config.resolve_token()?;
    let gateway = OctocrabCrawlGateway::for_token(&token, &config.api_base_url()?)?;
    let info = gateway.rate_limit().await?;
    write_rate_limit(&mut io::stdout().lock(), &info, Utc::now())
}
