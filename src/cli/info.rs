//! The `--info` command.

use std::io;

use devtalk::{DevtalkConfig, DevtalkError, TableStore};

use super::output::write_table_stats;

/// Prints per-kind table, row, and byte counts for the output directory.
///
/// # Errors
///
/// Returns [`DevtalkError`] when the data types are invalid, a table cannot
/// be read, or the summary cannot be written.
pub fn run(config: &DevtalkConfig) -> Result<(), DevtalkError> {
    let kinds = config.entity_kinds()?;
    let store = TableStore::new(config.output_path());
    let stats = store.stats(&kinds)?;
    write_table_stats(&mut io::stdout().lock(), store.root(), &stats)
}
