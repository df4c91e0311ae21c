//! Delete command implementation.

use super::add::MutationReport;
use crate::output::{print_report, OutputFormat};
use segdb_core::SegmentStore;

/// Runs the delete command.
pub fn run(
    store: &SegmentStore,
    id: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    store.delete(id)?;
    let report = MutationReport {
        id: id.to_string(),
        status: "deleted",
    };
    print_report(&report, MutationReport::text, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use segdb_core::Segment;

    #[test]
    fn delete_removes_segment() {
        let store = SegmentStore::in_memory();
        store.add(Segment::new("seg1", "true")).unwrap();
        run(&store, "seg1", OutputFormat::Text).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn delete_unknown_fails() {
        let store = SegmentStore::in_memory();
        assert!(run(&store, "nope", OutputFormat::Text).is_err());
    }
}
