//! End-to-end store scenarios.

use segdb_codec::Value;
use segdb_core::{CoreError, IndexFilter, Segment, SegmentStore};
use segdb_testkit::{populated_store, sample_segment, TestStore};
use std::collections::HashMap;
use std::sync::Arc;

fn ctx(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

fn ids(segments: &[Arc<Segment>]) -> Vec<&str> {
    segments.iter().map(|s| s.id.as_str()).collect()
}

#[test]
fn index_narrowing_runs_before_filters() {
    let store = SegmentStore::in_memory();
    store
        .add(Segment::new("A", "level>=1").with_index("idx1", 1))
        .unwrap();
    store
        .add(Segment::new("B", "level>=1").with_index("idx1", 2))
        .unwrap();

    let found = store.query(&ctx(&[("idx1", Value::Integer(1)), ("level", Value::Integer(1))]), 0);
    assert_eq!(ids(&found), vec!["A"]);
    assert_eq!(store.stats().ops.index_lookups, 1);
}

#[test]
fn shared_filters_and_limit() {
    let store = SegmentStore::in_memory();
    for i in 0..5 {
        store
            .add(Segment::new(format!("s{i}"), "level>=1 && uvs in [1,2,3]"))
            .unwrap();
    }

    let found = store.query(&ctx(&[("level", Value::Integer(1)), ("uvs", Value::Integer(1))]), 0);
    assert_eq!(ids(&found), vec!["s0", "s1", "s2", "s3", "s4"]);

    store
        .add(Segment::new("s5", "dps == 4 && level >= 2"))
        .unwrap();
    store.add(Segment::new("s6", "level > 5")).unwrap();

    let wide = ctx(&[
        ("level", Value::Integer(2)),
        ("uvs", Value::Integer(3)),
        ("dps", Value::Integer(4)),
    ]);
    assert_eq!(
        ids(&store.query(&wide, 0)),
        vec!["s0", "s1", "s2", "s3", "s4", "s5"]
    );
    assert_eq!(ids(&store.query(&wide, 2)), vec!["s0", "s1"]);
    assert_eq!(store.stats().ops.scans, 3);
}

#[test]
fn publish_replaces_everything() {
    let store = SegmentStore::in_memory();
    store.add(Segment::new("Y", "true")).unwrap();

    let stored = store.publish(vec![Segment::new("X", "true")]).unwrap();
    assert_eq!(stored, 1);
    assert!(matches!(store.get("Y"), Err(CoreError::NotFound { .. })));
    assert_eq!(store.get("X").unwrap().id, "X");
    store.verify().unwrap();
}

#[test]
fn compile_error_leaves_store_unchanged() {
    let store = populated_store(6);
    let before = store.stats();
    let listed = store.list(&IndexFilter::new(), 0, 0);

    let err = store
        .add(Segment::new("seg1", "level >=").with_index("idx1", 9))
        .unwrap_err();
    assert!(matches!(err, CoreError::Compile { .. }));

    let after = store.stats();
    assert_eq!(after.segments, before.segments);
    assert_eq!(after.index_buckets, before.index_buckets);
    assert_eq!(after.index_entries, before.index_entries);
    assert_eq!(after.index_footprint, before.index_footprint);
    assert_eq!(after.ops.errors, before.ops.errors + 1);
    assert_eq!(store.list(&IndexFilter::new(), 0, 0), listed);
    assert_eq!(*store.get("seg1").unwrap(), sample_segment(1));
}

#[test]
fn delete_clears_every_bucket() {
    let store = populated_store(6);
    store.delete("seg4").unwrap();

    assert!(matches!(store.get("seg4"), Err(CoreError::NotFound { .. })));
    assert!(!ids(&store.list(&IndexFilter::new(), 0, 0)).contains(&"seg4"));

    let mut filter = IndexFilter::new();
    filter.insert("idx1".to_string(), Value::Integer(1));
    filter.insert("idx2".to_string(), Value::Text("idx2_4".into()));
    assert_eq!(ids(&store.list(&filter, 0, 0)), vec!["seg1"]);
    store.verify().unwrap();

    assert!(store.delete("seg4").unwrap_err().is_not_found());
}

#[test]
fn list_pages_through_insertion_order() {
    let store = populated_store(5);
    store.add(sample_segment(1)).unwrap();

    let all = IndexFilter::new();
    assert_eq!(
        ids(&store.list(&all, 0, 0)),
        vec!["seg0", "seg2", "seg3", "seg4", "seg1"]
    );
    assert_eq!(ids(&store.list(&all, 2, 3)), vec!["seg4", "seg1"]);
    assert!(store.list(&all, 3, 5).is_empty());
    assert_eq!(store.list(&all, -1, -1).len(), 5);
}

#[test]
fn directory_store_survives_reopen() {
    let store = TestStore::dir();
    store
        .publish((0..4).map(sample_segment))
        .unwrap();
    store.delete("seg2").unwrap();

    let store = store.reopen();
    assert_eq!(store.len(), 3);
    assert!(!store.contains("seg2"));
    assert_eq!(*store.get("seg3").unwrap(), sample_segment(3));
    store.verify().unwrap();

    // Reloaded stores order by ID.
    assert_eq!(
        ids(&store.list(&IndexFilter::new(), 0, 0)),
        vec!["seg0", "seg1", "seg3"]
    );
}

#[test]
fn reload_picks_up_external_changes() {
    let first = TestStore::dir();
    first.add(sample_segment(0)).unwrap();

    let path = first.path().unwrap();
    let second = SegmentStore::open(segdb_core::StoreConfig::new().storage_path(&path)).unwrap();
    second.add(sample_segment(1)).unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first.load().unwrap(), 2);
    assert!(first.contains("seg1"));
}
