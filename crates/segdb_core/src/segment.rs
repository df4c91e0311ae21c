//! Segment type and its compiled in-store form.

use crate::error::{CoreError, CoreResult};
use crate::predicate::Predicate;
use segdb_codec::{SegmentRecord, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A stored segment.
///
/// `data` is an opaque payload owned by the caller. `filters` is the source
/// text of a boolean expression evaluated against query attributes.
/// `indexes` holds the exact-match lookup keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// Unique, non-empty identifier.
    pub id: String,
    /// Opaque payload.
    pub data: String,
    /// Filter expression source.
    pub filters: String,
    /// Indexed attributes.
    pub indexes: BTreeMap<String, Value>,
}

impl Segment {
    /// Creates a segment with no payload and no indexes.
    pub fn new(id: impl Into<String>, filters: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filters: filters.into(),
            ..Self::default()
        }
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Adds an indexed attribute.
    #[must_use]
    pub fn with_index(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.indexes.insert(name.into(), value.into().normalize());
        self
    }
}

impl From<SegmentRecord> for Segment {
    fn from(record: SegmentRecord) -> Self {
        Self {
            id: record.id,
            data: record.data,
            filters: record.filters,
            indexes: record.indexes,
        }
    }
}

impl From<&Segment> for SegmentRecord {
    fn from(segment: &Segment) -> Self {
        SegmentRecord {
            id: segment.id.clone(),
            data: segment.data.clone(),
            filters: segment.filters.clone(),
            indexes: segment.indexes.clone(),
        }
    }
}

impl From<Segment> for SegmentRecord {
    fn from(segment: Segment) -> Self {
        SegmentRecord {
            id: segment.id,
            data: segment.data,
            filters: segment.filters,
            indexes: segment.indexes,
        }
    }
}

/// A validated segment with its predicate compiled.
#[derive(Debug, Clone)]
pub(crate) struct CompiledSegment {
    pub(crate) id: Arc<str>,
    pub(crate) segment: Arc<Segment>,
    pub(crate) predicate: Predicate,
}

impl CompiledSegment {
    /// Validates, normalizes and compiles a segment.
    ///
    /// Fails on an empty ID, a non-finite index value or a filter that does
    /// not compile.
    pub(crate) fn prepare(mut segment: Segment) -> CoreResult<Self> {
        if segment.id.is_empty() {
            return Err(CoreError::validation("segment ID must not be empty"));
        }

        for (name, value) in &mut segment.indexes {
            if !value.is_finite() {
                return Err(CoreError::validation(format!(
                    "segment {:?}: index {name:?} is not a finite number",
                    segment.id
                )));
            }
            *value = std::mem::replace(value, Value::Bool(false)).normalize();
        }

        let predicate = Predicate::compile(&segment.filters)
            .map_err(|e| CoreError::compile(segment.id.as_str(), e))?;

        Ok(Self {
            id: Arc::from(segment.id.as_str()),
            segment: Arc::new(segment),
            predicate,
        })
    }

    pub(crate) fn to_record(&self) -> SegmentRecord {
        SegmentRecord::from(self.segment.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_normalizes_indexes() {
        let segment = Segment::new("seg1", "true")
            .with_data("payload")
            .with_index("idx1", 1.0)
            .with_index("idx2", "x");
        assert_eq!(segment.indexes["idx1"], Value::Integer(1));
        assert_eq!(segment.indexes["idx2"], Value::Text("x".into()));
        assert_eq!(segment.data, "payload");
    }

    #[test]
    fn record_conversion_roundtrip() {
        let segment = Segment::new("seg1", "level >= 1").with_index("idx1", 2);
        let record = SegmentRecord::from(&segment);
        assert_eq!(record.id, "seg1");
        assert_eq!(Segment::from(record), segment);
    }

    #[test]
    fn prepare_compiles_filter() {
        let compiled = CompiledSegment::prepare(Segment::new("seg1", "level >= 1")).unwrap();
        assert_eq!(&*compiled.id, "seg1");
        assert_eq!(compiled.predicate.source(), "level >= 1");
    }

    #[test]
    fn prepare_normalizes_raw_indexes() {
        let mut segment = Segment::new("seg1", "true");
        segment.indexes.insert("n".into(), Value::Float(-0.0));
        let compiled = CompiledSegment::prepare(segment).unwrap();
        assert_eq!(compiled.segment.indexes["n"], Value::Integer(0));
    }

    #[test]
    fn prepare_rejects_invalid_segments() {
        assert!(matches!(
            CompiledSegment::prepare(Segment::new("", "true")),
            Err(CoreError::Validation { .. })
        ));
        assert!(matches!(
            CompiledSegment::prepare(Segment::new("seg1", "level >=")),
            Err(CoreError::Compile { id, .. }) if id == "seg1"
        ));

        let mut segment = Segment::new("seg1", "true");
        segment.indexes.insert("n".into(), Value::Float(f64::NAN));
        assert!(matches!(
            CompiledSegment::prepare(segment),
            Err(CoreError::Validation { .. })
        ));
    }
}
