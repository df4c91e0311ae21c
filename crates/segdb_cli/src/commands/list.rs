//! List command implementation.

use crate::output::{print_segments, OutputFormat};
use segdb_codec::Value;
use segdb_core::{IndexFilter, SegmentStore};

/// Runs the list command.
pub fn run(
    store: &SegmentStore,
    index: Vec<(String, Value)>,
    limit: i64,
    offset: i64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter: IndexFilter = index.into_iter().collect();
    let segments = store.list(&filter, limit, offset);
    print_segments(&segments, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use segdb_core::Segment;

    #[test]
    fn list_with_and_without_filter() {
        let store = SegmentStore::in_memory();
        store.add(Segment::new("a", "true").with_index("idx1", 1)).unwrap();
        store.add(Segment::new("b", "true")).unwrap();

        run(&store, vec![], 0, 0, OutputFormat::Text).unwrap();
        run(&store, vec![("idx1".into(), Value::Integer(1))], 10, 0, OutputFormat::Json).unwrap();
        assert_eq!(store.stats().ops.queries, 2);
    }
}
