//! Inverted index over segment attributes.
//!
//! The index maps attribute name → attribute value → ordered list of segment
//! IDs, and keeps one global list of every live ID in insertion order. It is
//! a cache: [`IndexManager::rebuild`] reconstructs it from the segment map
//! at any time.

use segdb_codec::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::mem::size_of;
use std::sync::Arc;

/// An insertion-ordered list of IDs without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdList {
    order: Vec<Arc<str>>,
    members: HashSet<Arc<str>>,
}

impl IdList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` unless already present. Returns true if it was added.
    pub fn push(&mut self, id: &Arc<str>) -> bool {
        if !self.members.insert(Arc::clone(id)) {
            return false;
        }
        self.order.push(Arc::clone(id));
        true
    }

    /// Removes `id`. Returns true if it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|existing| &**existing != id);
        true
    }

    /// Returns true if `id` is in the list.
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Iterates IDs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<str>> {
        self.order.iter()
    }

    /// Number of IDs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Secondary index state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexManager {
    buckets: HashMap<String, HashMap<Value, IdList>>,
    ids: IdList,
}

impl IndexManager {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a segment's attributes.
    ///
    /// With `clear_first`, every existing reference to `id` is dropped
    /// before the new attributes are added, so the segment also moves to the
    /// end of the global insertion order.
    pub fn index_segment(
        &mut self,
        id: &Arc<str>,
        indexes: &BTreeMap<String, Value>,
        clear_first: bool,
    ) {
        if clear_first {
            self.deindex(id);
        }

        for (name, value) in indexes {
            if let Some(values) = self.buckets.get_mut(name) {
                values.entry(value.clone()).or_default().push(id);
            } else {
                let mut list = IdList::new();
                list.push(id);
                self.buckets
                    .insert(name.clone(), HashMap::from([(value.clone(), list)]));
            }
        }
        self.ids.push(id);
    }

    /// Removes every reference to `id`. Returns true if it was indexed.
    pub fn deindex(&mut self, id: &str) -> bool {
        let was_present = self.ids.remove(id);
        self.buckets.retain(|_, values| {
            values.retain(|_, list| {
                list.remove(id);
                !list.is_empty()
            });
            !values.is_empty()
        });
        was_present
    }

    /// Discards all state and indexes `entries` in the order given.
    pub fn rebuild<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a Arc<str>, &'a BTreeMap<String, Value>)>,
    {
        self.buckets.clear();
        self.ids = IdList::new();
        for (id, indexes) in entries {
            self.index_segment(id, indexes, false);
        }
    }

    /// Every live ID in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &Arc<str>> {
        self.ids.iter()
    }

    /// Number of live IDs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns true if any segment is indexed under `name`.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Returns the bucket for one (name, value) pair.
    ///
    /// Integral floats find the integer bucket, as stored values are
    /// normalized on ingestion.
    pub fn bucket(&self, name: &str, value: &Value) -> Option<&IdList> {
        let values = self.buckets.get(name)?;
        match value {
            Value::Float(_) => values.get(&value.clone().normalize()),
            _ => values.get(value),
        }
    }

    /// Union of the buckets named by `filter`, first-seen order.
    ///
    /// Pairs are visited in ascending attribute-name order. Names with no
    /// index contribute nothing.
    pub fn candidates<'a>(&'a self, filter: &BTreeMap<String, Value>) -> Vec<&'a Arc<str>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        for (name, value) in filter {
            let Some(list) = self.bucket(name, value) else {
                continue;
            };
            for id in list.iter() {
                if seen.insert(id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Number of distinct attribute names.
    pub fn attribute_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of (name, value) buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }

    /// Number of IDs across all buckets.
    pub fn entry_count(&self) -> usize {
        self.buckets
            .values()
            .flat_map(HashMap::values)
            .map(IdList::len)
            .sum()
    }

    /// Estimated heap usage in bytes.
    ///
    /// ID text is shared between lists and counted once.
    pub fn footprint(&self) -> usize {
        // each entry lives in a Vec and a HashSet
        let per_entry = 2 * size_of::<Arc<str>>();
        let per_list = size_of::<IdList>();

        let id_text: usize = self.ids.iter().map(|id| id.len()).sum();
        let mut total = id_text + per_list + self.ids.len() * per_entry;

        for (name, values) in &self.buckets {
            total += name.len() + size_of::<String>() + size_of::<HashMap<Value, IdList>>();
            for (value, list) in values {
                total += size_of::<Value>() + per_list + list.len() * per_entry;
                if let Value::Text(text) = value {
                    total += text.len();
                }
            }
        }
        total
    }

    /// Describes the first difference from `expected`, if any.
    pub fn first_difference(&self, expected: &Self) -> Option<String> {
        if self.ids.order != expected.ids.order {
            return Some(format!(
                "global ID list has {} entries, expected {}",
                self.ids.len(),
                expected.ids.len()
            ));
        }

        let mut names: Vec<&String> = self.buckets.keys().chain(expected.buckets.keys()).collect();
        names.sort();
        names.dedup();

        for name in names {
            let (Some(actual), Some(wanted)) = (self.buckets.get(name), expected.buckets.get(name))
            else {
                return Some(format!("attribute {name:?} present on only one side"));
            };
            for (value, list) in actual {
                match wanted.get(value) {
                    Some(other) if other.order == list.order => {}
                    Some(_) => return Some(format!("bucket {name}={value} differs")),
                    None => return Some(format!("unexpected bucket {name}={value}")),
                }
            }
            if let Some(value) = wanted.keys().find(|value| !actual.contains_key(*value)) {
                return Some(format!("missing bucket {name}={value}"));
            }
        }
        None
    }
}
