//! Publish command implementation.
//!
//! Input is a JSON array of segment records:
//!
//! ```json
//! [
//!   {"id": "seg1", "data": "payload", "filters": "level >= 1", "indexes": {"idx1": 1}}
//! ]
//! ```

use crate::output::{print_report, OutputFormat};
use segdb_codec::SegmentRecord;
use segdb_core::{Segment, SegmentStore};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Result of a publish.
#[derive(Debug, Serialize)]
pub struct PublishReport {
    /// Records read from the input file.
    pub submitted: usize,
    /// Segments stored after duplicates collapsed.
    pub stored: usize,
}

/// Reads segments from a JSON file.
pub fn read_segments(path: &Path) -> Result<Vec<Segment>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let records: Vec<SegmentRecord> = serde_json::from_str(&text)
        .map_err(|e| format!("invalid segment file {}: {e}", path.display()))?;
    Ok(records.into_iter().map(Segment::from).collect())
}

/// Runs the publish command.
pub fn run(
    store: &SegmentStore,
    file: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Publishing segments from {:?}", file);
    let segments = read_segments(file)?;
    let submitted = segments.len();
    let stored = store.publish(segments)?;

    print_report(
        &PublishReport { submitted, stored },
        |r| format!("published {} segments ({} submitted)\n", r.stored, r.submitted),
        format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use segdb_codec::Value;
    use tempfile::tempdir;

    #[test]
    fn read_segments_from_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segments.json");
        fs::write(
            &path,
            r#"[
                {"id": "a", "data": "x", "filters": "level >= 1", "indexes": {"idx1": 1.0, "idx2": "s"}},
                {"id": "b", "filters": "true"}
            ]"#,
        )
        .unwrap();

        let segments = read_segments(&path).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].indexes["idx1"], Value::Integer(1));
        assert_eq!(segments[1].data, "");
    }

    #[test]
    fn publish_replaces_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segments.json");
        fs::write(&path, r#"[{"id": "x", "filters": "true"}, {"id": "x", "filters": "false"}]"#)
            .unwrap();

        let store = SegmentStore::in_memory();
        store.add(Segment::new("old", "true")).unwrap();
        run(&store, &path, OutputFormat::Json).unwrap();

        assert!(!store.contains("old"));
        assert_eq!(store.get("x").unwrap().filters, "false");
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segments.json");
        fs::write(&path, r#"{"id": "x"}"#).unwrap();
        assert!(read_segments(&path).is_err());
        assert!(read_segments(&dir.path().join("absent.json")).is_err());
    }
}
