//! Property-based test generators using proptest.
//!
//! Names and IDs are drawn from small spaces so that generated segments
//! collide on IDs and share index buckets.

use proptest::prelude::*;
use segdb_codec::Value;
use segdb_core::Segment;
use std::collections::HashMap;

/// Attribute names that generated filters refer to.
pub const FILTER_ATTRIBUTES: &[&str] = &["level", "uvs", "country", "active"];

/// Strategy for finite, normalized values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-100i64..100).prop_map(Value::Integer),
        any::<i16>().prop_map(|n| Value::Float(f64::from(n) + 0.5)),
        "[a-z]{0,6}".prop_map(Value::Text),
    ]
}

/// Strategy for index attribute names.
pub fn index_name_strategy() -> impl Strategy<Value = String> {
    "idx[1-4]"
}

/// Strategy for segment IDs.
pub fn segment_id_strategy() -> impl Strategy<Value = String> {
    "s[0-9]{1,2}"
}

/// Strategy for filter sources that always compile.
pub fn filter_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("true".to_string()),
        (0i64..5).prop_map(|n| format!("level >= {n}")),
        prop::collection::vec(0i64..5, 1..4).prop_map(|items| {
            let items: Vec<String> = items.iter().map(ToString::to_string).collect();
            format!("uvs in [{}]", items.join(", "))
        }),
        "[a-z]{2}".prop_map(|c| format!("country == \"{c}\"")),
        (0i64..5, any::<bool>())
            .prop_map(|(n, active)| format!("level > {n} && active == {active}")),
        "[a-z]{1,2}".prop_map(|p| format!("country startsWith \"{p}\" || !active")),
    ]
}

/// Strategy for valid segments.
pub fn segment_strategy() -> impl Strategy<Value = Segment> {
    (
        segment_id_strategy(),
        filter_strategy(),
        "[a-z ]{0,16}",
        prop::collection::btree_map(index_name_strategy(), value_strategy(), 0..3),
    )
        .prop_map(|(id, filters, data, indexes)| {
            indexes
                .into_iter()
                .fold(Segment::new(id, filters).with_data(data), |segment, (name, value)| {
                    segment.with_index(name, value)
                })
        })
}

/// Strategy for query attributes over filter and index names.
pub fn attributes_strategy() -> impl Strategy<Value = HashMap<String, Value>> {
    let name = prop_oneof![
        prop::sample::select(FILTER_ATTRIBUTES).prop_map(str::to_string),
        index_name_strategy(),
    ];
    prop::collection::hash_map(name, value_strategy(), 0..5)
}

/// A store operation for model-based tests.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Add or replace a segment.
    Add(Segment),
    /// Delete a segment.
    Delete {
        /// Segment ID.
        id: String,
    },
    /// Get a segment.
    Get {
        /// Segment ID.
        id: String,
    },
}

/// Strategy for store operations.
pub fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        3 => segment_strategy().prop_map(StoreOp::Add),
        1 => segment_id_strategy().prop_map(|id| StoreOp::Delete { id }),
        2 => segment_id_strategy().prop_map(|id| StoreOp::Get { id }),
    ]
}

/// Strategy for a sequence of store operations.
pub fn op_sequence_strategy(min_ops: usize, max_ops: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    prop::collection::vec(store_op_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segdb_core::Predicate;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn values_are_normalized(value in value_strategy()) {
            prop_assert!(value.is_finite());
            prop_assert_eq!(value.clone().normalize(), value);
        }

        #[test]
        fn filters_compile(source in filter_strategy()) {
            prop_assert!(Predicate::compile(&source).is_ok(), "{}", source);
        }

        #[test]
        fn segments_have_ids(segment in segment_strategy()) {
            prop_assert!(!segment.id.is_empty());
            prop_assert!(segment.indexes.len() <= 2);
        }

        #[test]
        fn sequences_respect_bounds(ops in op_sequence_strategy(2, 10)) {
            prop_assert!((2..10).contains(&ops.len()));
        }
    }
}
