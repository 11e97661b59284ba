//! The `--delete` command.

use std::io;

use devtalk::{DevtalkConfig, DevtalkError, TableStore};

use super::output::write_delete_summary;

/// Removes every table of the configured data types.
///
/// # Errors
///
/// Returns [`DevtalkError`] when the data types are invalid, a table cannot
/// be removed, or the summary cannot be written.
pub fn run(config: &DevtalkConfig) -> Result<(), DevtalkError> {
    let kinds = config.entity_kinds()?;
    let store = TableStore::new(config.output_path());
    let summary = store.delete(&kinds)?;
    tracing::info!(
        output_dir = %store.root(),
        removed = summary.removed.len(),
        "deleted tables"
    );
    write_delete_summary(&mut io::stdout().lock(), store.root(), &summary)
}
