//! The default command: crawl repositories into CSV tables.

use std::io;
use std::sync::Arc;

use devtalk::telemetry::{NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetrySink};
use devtalk::{
    CrawlReport, DevtalkConfig, DevtalkError, EntityWalker, OctocrabCrawlGateway, Orchestrator,
    QueryExecutor, RateBudget, TableStore,
};

use super::output::write_crawl_summary;

/// Crawls every configured (repository, data type) pair.
///
/// The summary is printed even when the run aborts, so the pairs completed
/// before the failure are visible.
///
/// # Errors
///
/// Returns [`DevtalkError`] when the configuration is incomplete, the
/// gateway cannot be built, or the run aborts on a run-fatal failure.
pub async fn run(config: &DevtalkConfig) -> Result<CrawlReport, DevtalkError> {
    let kinds = config.entity_kinds()?;
    let targets = config.load_targets()?;
    for invalid in &targets.invalid {
        tracing::warn!(
            line = invalid.line,
            input = %invalid.input,
            "skipping invalid repository: {}",
            invalid.error
        );
    }
    let token = config.resolve_token()?;
    let gateway = OctocrabCrawlGateway::for_token(&token, &config.api_base_url()?)?;

    let telemetry: Arc<dyn TelemetrySink> = if config.telemetry {
        Arc::new(StderrJsonlTelemetrySink)
    } else {
        Arc::new(NoopTelemetrySink)
    };
    let budget = RateBudget::new(config.budget_settings()).with_telemetry(Arc::clone(&telemetry));
    let executor = QueryExecutor::new(Arc::new(gateway), budget);
    let walker = EntityWalker::new(executor, config.walk_settings())
        .with_telemetry(Arc::clone(&telemetry));
    let store = TableStore::new(config.output_path());
    let orchestrator = Orchestrator::new(walker, store).with_telemetry(telemetry);

    tracing::info!(
        repositories = targets.targets.len(),
        data_types = kinds.len(),
        workers = config.workers,
        output_dir = %config.output_dir,
        "starting crawl"
    );
    let result = orchestrator
        .run_parallel(&targets, &kinds, config.workers)
        .await;

    let mut stdout = io::stdout().lock();
    match result {
        Ok(report) => {
            write_crawl_summary(&mut stdout, &report)?;
            Ok(report)
        }
        Err(aborted) => {
            write_crawl_summary(&mut stdout, &aborted.report)?;
            Err(aborted.into())
        }
    }
}
