//! Add command implementation.

use crate::output::{print_report, OutputFormat};
use segdb_codec::Value;
use segdb_core::{Segment, SegmentStore};
use serde::Serialize;

/// Result of a single-segment mutation.
#[derive(Debug, Serialize)]
pub struct MutationReport {
    /// Affected segment.
    pub id: String,
    /// What happened (`added`, `replaced`, `deleted`).
    pub status: &'static str,
}

impl MutationReport {
    /// Text rendering.
    pub fn text(&self) -> String {
        format!("{} {}\n", self.status, self.id)
    }
}

/// Runs the add command.
pub fn run(
    store: &SegmentStore,
    id: String,
    filters: String,
    data: Option<String>,
    indexes: Vec<(String, Value)>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut segment = Segment::new(id, filters);
    if let Some(data) = data {
        segment = segment.with_data(data);
    }
    for (name, value) in indexes {
        segment = segment.with_index(name, value);
    }

    let replaced = store.contains(&segment.id);
    let id = segment.id.clone();
    store.add(segment)?;

    let report = MutationReport {
        id,
        status: if replaced { "replaced" } else { "added" },
    };
    print_report(&report, MutationReport::text, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_stores_segment() {
        let store = SegmentStore::in_memory();
        run(
            &store,
            "seg1".into(),
            "level >= 1".into(),
            Some("payload".into()),
            vec![("idx1".into(), Value::Integer(1))],
            OutputFormat::Json,
        )
        .unwrap();

        let segment = store.get("seg1").unwrap();
        assert_eq!(segment.data, "payload");
        assert_eq!(segment.indexes["idx1"], Value::Integer(1));
    }

    #[test]
    fn add_surfaces_compile_errors() {
        let store = SegmentStore::in_memory();
        let result = run(&store, "seg1".into(), "level >=".into(), None, vec![], OutputFormat::Text);
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn report_text() {
        let report = MutationReport {
            id: "seg1".into(),
            status: "added",
        };
        assert_eq!(report.text(), "added seg1\n");
    }
}
