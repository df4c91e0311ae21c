//! Verify command implementation.

use crate::output::{print_report, OutputFormat};
use segdb_core::{CoreError, SegmentStore};
use serde::Serialize;
use tracing::info;

/// Verification result.
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    /// Segments checked.
    pub segments: usize,
    /// First inconsistency found, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<String>,
}

impl VerifyReport {
    fn text(&self) -> String {
        match &self.drift {
            None => format!("✓ Index consistent ({} segments)\n", self.segments),
            Some(message) => format!("✗ Index drift: {message}\n"),
        }
    }
}

/// Runs the verify command.
pub fn run(store: &SegmentStore, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    info!("Verifying index of {:?}", store.config().storage_path);
    let drift = match store.verify() {
        Ok(()) => None,
        Err(CoreError::IndexDrift { message }) => Some(message),
        Err(e) => return Err(e.into()),
    };

    let report = VerifyReport {
        segments: store.len(),
        drift,
    };
    print_report(&report, VerifyReport::text, format)?;

    if report.drift.is_some() {
        return Err(CoreError::index_drift("verification failed").into());
    }
    Ok(())
}
