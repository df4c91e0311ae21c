//! Query command implementation.

use crate::output::{print_segments, OutputFormat};
use segdb_codec::Value;
use segdb_core::SegmentStore;
use std::collections::HashMap;

/// Runs the query command.
pub fn run(
    store: &SegmentStore,
    attrs: Vec<(String, Value)>,
    limit: i64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let attrs: HashMap<String, Value> = attrs.into_iter().collect();
    let segments = store.query(&attrs, limit);
    print_segments(&segments, format)
}
