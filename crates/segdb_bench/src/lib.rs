//! Benchmark utilities.

use rand::seq::SliceRandom;
use rand::Rng;
use segdb_codec::Value;
use segdb_core::Segment;
use std::collections::HashMap;

const FILTERS: &[&str] = &[
    "level >= 1 && uvs in [1,2,3]",
    "country == \"us\" || country == \"ca\"",
    "level > 3 && active == true",
    "not (dps in [7, 8, 9])",
    "score / 2 >= 10.5 && country startsWith \"u\"",
];

const COUNTRIES: &[&str] = &["us", "ca", "de", "fr", "jp"];

/// Generates `count` segments with random filters and `idx1` spread over
/// `buckets` values.
pub fn random_segments<R: Rng>(rng: &mut R, count: usize, buckets: i64) -> Vec<Segment> {
    (0..count)
        .map(|i| {
            let filter = FILTERS.choose(rng).copied().unwrap_or("true");
            Segment::new(format!("seg{i}"), filter)
                .with_data(format!("payload {i}"))
                .with_index("idx1", rng.gen_range(0..buckets.max(1)))
                .with_index("idx2", format!("idx2_{i}"))
        })
        .collect()
}

/// Generates a query context touching every filter attribute.
///
/// With `indexed` set, the context also carries an `idx1` value.
pub fn random_context<R: Rng>(rng: &mut R, buckets: i64, indexed: bool) -> HashMap<String, Value> {
    let mut ctx = HashMap::new();
    ctx.insert("level".to_string(), Value::Integer(rng.gen_range(0..6)));
    ctx.insert("uvs".to_string(), Value::Integer(rng.gen_range(0..5)));
    ctx.insert("dps".to_string(), Value::Integer(rng.gen_range(0..10)));
    ctx.insert("score".to_string(), Value::Integer(rng.gen_range(0..40)));
    ctx.insert("active".to_string(), Value::Bool(rng.gen()));
    let country = COUNTRIES.choose(rng).copied().unwrap_or("us");
    ctx.insert("country".to_string(), Value::Text(country.to_string()));
    if indexed {
        ctx.insert("idx1".to_string(), Value::Integer(rng.gen_range(0..buckets.max(1))));
    }
    ctx
}

/// Every filter source the generators use.
pub fn filter_sources() -> &'static [&'static str] {
    FILTERS
}
