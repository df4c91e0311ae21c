//! Reload command implementation.

use crate::output::{print_report, OutputFormat};
use segdb_core::SegmentStore;
use serde::Serialize;
use tracing::info;

/// Result of a reload.
#[derive(Debug, Serialize)]
pub struct ReloadReport {
    /// Segments loaded from storage.
    pub segments: usize,
}

/// Runs the reload command.
pub fn run(store: &SegmentStore, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    info!("Reloading segments from {:?}", store.config().storage_path);
    let segments = store.load()?;
    print_report(
        &ReloadReport { segments },
        |r| format!("loaded {} segments\n", r.segments),
        format,
    )
}
