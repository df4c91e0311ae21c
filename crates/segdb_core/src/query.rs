//! Listing and predicate queries over a borrowed store snapshot.

use crate::index::IndexManager;
use crate::predicate::Attributes;
use crate::segment::{CompiledSegment, Segment};
use segdb_codec::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::ops::Range;
use std::sync::Arc;

/// Exact-match index filter. Pairs are OR-ed together.
pub type IndexFilter = BTreeMap<String, Value>;

pub(crate) type SegmentMap = HashMap<Arc<str>, CompiledSegment>;

/// How a query chose its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryPlan {
    /// Every segment, in insertion order.
    FullScan,
    /// Union of index buckets.
    IndexLookup,
}

#[derive(Debug)]
pub(crate) struct QueryOutcome {
    pub(crate) segments: Vec<Arc<Segment>>,
    pub(crate) plan: QueryPlan,
    pub(crate) candidates: usize,
}

/// Computes the slice of `total` candidates selected by `limit` and `offset`.
///
/// A limit below 1 means unlimited. The offset is clamped to `[0, total]`
/// and the window never runs past `total`.
pub(crate) fn window(total: usize, limit: i64, offset: i64) -> Range<usize> {
    let start = usize::try_from(offset).unwrap_or(0).min(total);
    let len = if limit < 1 {
        total
    } else {
        usize::try_from(limit).unwrap_or(usize::MAX)
    };
    start..start.saturating_add(len).min(total)
}

/// Query context with indexed attribute names hidden.
struct Unindexed<'a, S> {
    attrs: &'a HashMap<String, Value, S>,
    index: &'a IndexManager,
}

impl<S: BuildHasher> Attributes for Unindexed<'_, S> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        if self.index.has_attribute(name) {
            None
        } else {
            self.attrs.get(name)
        }
    }
}

/// Read-only view over the segment map and its index.
pub(crate) struct QueryEngine<'a> {
    segments: &'a SegmentMap,
    index: &'a IndexManager,
}

impl<'a> QueryEngine<'a> {
    pub(crate) fn new(segments: &'a SegmentMap, index: &'a IndexManager) -> Self {
        Self { segments, index }
    }

    fn resolve(&self, id: &str) -> Option<&'a CompiledSegment> {
        self.segments.get(id)
    }

    /// Lists segments matching any pair of `filter`, paginated.
    ///
    /// An empty filter lists every segment in insertion order.
    pub(crate) fn list(&self, filter: &IndexFilter, limit: i64, offset: i64) -> Vec<Arc<Segment>> {
        let candidates: Vec<&Arc<str>> = if filter.is_empty() {
            self.index.ids().collect()
        } else {
            self.index.candidates(filter)
        };

        let range = window(candidates.len(), limit, offset);
        candidates[range]
            .iter()
            .filter_map(|id| self.resolve(id))
            .map(|entry| Arc::clone(&entry.segment))
            .collect()
    }

    /// Returns segments whose predicate matches `attrs`.
    ///
    /// Attributes that name a known index narrow the candidates and are
    /// hidden from predicate evaluation. Without any, every segment is
    /// evaluated in insertion order. A positive `limit` stops the scan
    /// early.
    pub(crate) fn query<S: BuildHasher>(
        &self,
        attrs: &HashMap<String, Value, S>,
        limit: i64,
    ) -> QueryOutcome {
        let filter: IndexFilter = attrs
            .iter()
            .filter(|(name, _)| self.index.has_attribute(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let (candidates, plan): (Vec<&Arc<str>>, _) = if filter.is_empty() {
            (self.index.ids().collect(), QueryPlan::FullScan)
        } else {
            (self.index.candidates(&filter), QueryPlan::IndexLookup)
        };

        let context = Unindexed {
            attrs,
            index: self.index,
        };
        let cap = usize::try_from(limit).ok().filter(|&n| n > 0);

        let mut segments = Vec::new();
        for id in &candidates {
            if cap.is_some_and(|cap| segments.len() >= cap) {
                break;
            }
            let Some(entry) = self.resolve(id) else {
                continue;
            };
            if entry.predicate.evaluate(&context) {
                segments.push(Arc::clone(&entry.segment));
            }
        }

        QueryOutcome {
            segments,
            plan,
            candidates: candidates.len(),
        }
    }
}
