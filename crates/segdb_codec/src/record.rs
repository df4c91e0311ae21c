//! Durable segment record and its CBOR envelope.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version written into every record envelope.
pub const FORMAT_VERSION: u16 = 1;

/// The persisted shape of a segment.
///
/// A record carries only source data: the filter expression is stored as
/// text and compiled again whenever the record is ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Unique segment identifier.
    pub id: String,
    /// Opaque payload.
    #[serde(default)]
    pub data: String,
    /// Filter expression source text.
    pub filters: String,
    /// Indexed scalar attributes.
    #[serde(default)]
    pub indexes: BTreeMap<String, Value>,
}

impl SegmentRecord {
    /// Creates a record with an empty payload and no indexes.
    pub fn new(id: impl Into<String>, filters: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: String::new(),
            filters: filters.into(),
            indexes: BTreeMap::new(),
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

    /// Normalizes every index value in place.
    pub fn normalize(&mut self) {
        for value in self.indexes.values_mut() {
            let owned = std::mem::replace(value, Value::Bool(false));
            *value = owned.normalize();
        }
    }

    fn check_finite(&self) -> CodecResult<()> {
        match self.indexes.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, _)) => Err(CodecError::NonFiniteFloat {
                attribute: name.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u16,
    record: &'a SegmentRecord,
}

#[derive(Deserialize)]
struct Envelope {
    version: u16,
    record: SegmentRecord,
}

/// Encodes a record into its versioned CBOR envelope.
///
/// # Errors
///
/// Returns an error if an index value is NaN or infinite, or if the
/// serializer fails.
pub fn encode_record(record: &SegmentRecord) -> CodecResult<Vec<u8>> {
    record.check_finite()?;

    let envelope = EnvelopeRef {
        version: FORMAT_VERSION,
        record,
    };
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(&envelope, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decodes a record from its versioned CBOR envelope.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid envelope or were written
/// by a different format version.
pub fn decode_record(bytes: &[u8]) -> CodecResult<SegmentRecord> {
    let envelope: Envelope = ciborium::de::from_reader(bytes)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;

    if envelope.version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: envelope.version,
            expected: FORMAT_VERSION,
        });
    }

    let mut record = envelope.record;
    record.normalize();
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SegmentRecord {
        SegmentRecord::new("seg1", "level >= 1 && uvs in [1,2,3]")
            .with_data("test data")
            .with_index("idx1", 1)
            .with_index("idx2", "idx2_str")
            .with_index("ratio", 0.25)
            .with_index("active", true)
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        let record = sample();
        let decoded = decode_record(&encode_record(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn with_index_normalizes() {
        let record = SegmentRecord::new("a", "true").with_index("n", 7.0);
        assert_eq!(record.indexes["n"], Value::Integer(7));
    }

    #[test]
    fn nan_is_rejected_on_encode() {
        let mut record = SegmentRecord::new("a", "true");
        record.indexes.insert("bad".into(), Value::Float(f64::NAN));
        assert_eq!(
            encode_record(&record),
            Err(CodecError::NonFiniteFloat {
                attribute: "bad".into()
            })
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        #[derive(Serialize)]
        struct Future<'a> {
            version: u16,
            record: &'a SegmentRecord,
        }

        let record = sample();
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(
            &Future {
                version: FORMAT_VERSION + 1,
                record: &record,
            },
            &mut bytes,
        )
        .unwrap();

        assert!(matches!(
            decode_record(&bytes),
            Err(CodecError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result = decode_record(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn json_shape_matches_publish_payload() {
        let json = r#"{"id":"seg1","data":"d","filters":"level >= 1","indexes":{"idx1":1.0,"idx2":"s"}}"#;
        let record: SegmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.indexes["idx1"], Value::Integer(1));
        assert_eq!(record.indexes["idx2"], Value::Text("s".into()));

        let minimal: SegmentRecord = serde_json::from_str(r#"{"id":"x","filters":"true"}"#).unwrap();
        assert!(minimal.data.is_empty());
        assert!(minimal.indexes.is_empty());
    }
}
