//! Get and get-all command implementations.

use crate::output::{print_segments, OutputFormat};
use segdb_core::SegmentStore;

/// Runs the get command.
pub fn run(
    store: &SegmentStore,
    id: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let segment = store.get(id)?;
    print_segments(&[segment], format)
}

/// Runs the get-all command. Unknown IDs are skipped.
pub fn run_all(
    store: &SegmentStore,
    ids: &[String],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let segments = store.get_all(ids);
    print_segments(&segments, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use segdb_core::Segment;

    #[test]
    fn get_known_and_unknown() {
        let store = SegmentStore::in_memory();
        store.add(Segment::new("seg1", "true")).unwrap();
        run(&store, "seg1", OutputFormat::Text).unwrap();
        assert!(run(&store, "nope", OutputFormat::Text).is_err());
    }

    #[test]
    fn get_all_skips_unknown() {
        let store = SegmentStore::in_memory();
        store.add(Segment::new("seg1", "true")).unwrap();
        run_all(&store, &["nope".into(), "seg1".into()], OutputFormat::Json).unwrap();
    }
}
