//! Output formatting utilities for CLI commands.

use std::io::{self, Write};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use devtalk::sink::{DeleteSummary, KindStats};
use devtalk::{CrawlReport, DevtalkError, RateLimitInfo};

/// Writes the per-pair outcomes and totals of a crawl.
pub fn write_crawl_summary<W: Write>(
    writer: &mut W,
    report: &CrawlReport,
) -> Result<(), DevtalkError> {
    for pair in &report.pairs {
        writeln!(writer, "{} {}: {}", pair.target, pair.kind, pair.outcome)
            .map_err(|e| io_error(&e))?;
    }
    for invalid in &report.invalid {
        writeln!(
            writer,
            "line {}: invalid repository '{}': {}",
            invalid.line, invalid.input, invalid.error
        )
        .map_err(|e| io_error(&e))?;
    }

    let (entities, comments) = report.rows_written();
    writeln!(writer).map_err(|e| io_error(&e))?;
    writeln!(
        writer,
        "{} completed, {} already present, {} inaccessible, {} failed ({entities} entities, {comments} comments written)",
        report.completed(),
        report.skipped_existing(),
        report.skipped_inaccessible(),
        report.failed(),
    )
    .map_err(|e| io_error(&e))?;

    let failed = report.failed_targets();
    if !failed.is_empty() {
        writeln!(writer, "Re-run to retry:").map_err(|e| io_error(&e))?;
        for target in failed {
            writeln!(writer, "  {target}").map_err(|e| io_error(&e))?;
        }
    }
    Ok(())
}

/// Writes the token's rate limit as of `now`.
pub fn write_rate_limit<W: Write>(
    writer: &mut W,
    info: &RateLimitInfo,
    now: DateTime<Utc>,
) -> Result<(), DevtalkError> {
    writeln!(writer, "Limit:     {}", info.limit()).map_err(|e| io_error(&e))?;
    writeln!(writer, "Remaining: {}", info.remaining()).map_err(|e| io_error(&e))?;
    if let Some(cost) = info.cost() {
        writeln!(writer, "Cost:      {cost}").map_err(|e| io_error(&e))?;
    }
    let reset = info
        .reset_at()
        .and_then(|seconds| i64::try_from(seconds).ok())
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0));
    match reset {
        Some(at) => {
            let wait = at.signed_duration_since(now).num_seconds().max(0);
            writeln!(writer, "Resets:    {} (in {wait}s)", at.to_rfc3339())
                .map_err(|e| io_error(&e))?;
        }
        None => writeln!(writer, "Resets:    unknown").map_err(|e| io_error(&e))?,
    }
    Ok(())
}

/// Writes per-kind table statistics.
pub fn write_table_stats<W: Write>(
    writer: &mut W,
    root: &Utf8Path,
    stats: &[KindStats],
) -> Result<(), DevtalkError> {
    writeln!(writer, "Tables in {root}:").map_err(|e| io_error(&e))?;
    for kind in stats {
        writeln!(
            writer,
            "  {:<14} {} tables, {} entities, {} comments, {} bytes",
            kind.kind.dir_name(),
            kind.tables,
            kind.entity_rows,
            kind.comment_rows,
            kind.bytes
        )
        .map_err(|e| io_error(&e))?;
    }
    Ok(())
}

/// Writes the outcome of a delete.
pub fn write_delete_summary<W: Write>(
    writer: &mut W,
    root: &Utf8Path,
    summary: &DeleteSummary,
) -> Result<(), DevtalkError> {
    for path in &summary.removed {
        writeln!(writer, "removed {}", root.join(path)).map_err(|e| io_error(&e))?;
    }
    for kind in &summary.missing {
        writeln!(writer, "no {} tables in {root}", kind.dir_name()).map_err(|e| io_error(&e))?;
    }
    writeln!(writer, "{} tables deleted", summary.removed.len()).map_err(|e| io_error(&e))
}

fn io_error(error: &io::Error) -> DevtalkError {
    DevtalkError::Io {
        message: error.to_string(),
    }
}
