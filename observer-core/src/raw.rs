//! Raw Containers
//!
//! A [`RawState`] is the untracked container behind every observable. It is a
//! cheap, shared handle: cloning it clones the handle, never the data, and two
//! handles are equal only when they point at the same container.
//!
//! Every method here is raw access. Reads never register dependencies and
//! writes never trigger reactions, even though the changes are visible
//! through any observable wrapping the same container.
//!
//! # Kinds
//!
//! | Kind       | Data                          | Iterable |
//! |------------|-------------------------------|----------|
//! | `Record`   | named properties              | keys     |
//! | `Sequence` | dense list of values          | yes      |
//! | `Set`      | unique values, insertion order| yes      |
//! | `Map`      | key/value pairs, insertion order | yes   |
//! | `WeakSet`  | containers, held weakly       | no       |
//! | `WeakMap`  | container keys held weakly    | no       |
//!
//! All kinds also carry a record of custom named properties. For `Record`
//! those properties are the whole container.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::value::Value;

/// Stable identity of a raw container.
///
/// Ids are never reused, so an id that outlives its container can never be
/// confused with another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The kind of a raw container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Record,
    Sequence,
    Set,
    Map,
    WeakSet,
    WeakMap,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Record => "record",
            Self::Sequence => "sequence",
            Self::Set => "set",
            Self::Map => "map",
            Self::WeakSet => "weak set",
            Self::WeakMap => "weak map",
        })
    }
}

/// Shared handle to a raw container.
#[derive(Clone)]
pub struct RawState(Arc<RawInner>);

pub(crate) struct RawInner {
    id: TargetId,
    kind: ContainerKind,
    data: RwLock<RawData>,
}

struct RawData {
    properties: IndexMap<Arc<str>, Value>,
    body: Body,
}

struct WeakEntry {
    key: Weak<RawInner>,
    value: Value,
}

enum Body {
    Record,
    Sequence(Vec<Value>),
    Set(IndexSet<Value>),
    Map(IndexMap<Value, Value>),
    WeakSet(HashMap<TargetId, Weak<RawInner>>),
    WeakMap(HashMap<TargetId, WeakEntry>),
}

impl Body {
    fn kind(&self) -> ContainerKind {
        match self {
            Self::Record => ContainerKind::Record,
            Self::Sequence(_) => ContainerKind::Sequence,
            Self::Set(_) => ContainerKind::Set,
            Self::Map(_) => ContainerKind::Map,
            Self::WeakSet(_) => ContainerKind::WeakSet,
            Self::WeakMap(_) => ContainerKind::WeakMap,
        }
    }
}

/// Largest length a sequence can be grown to by writing past its end.
pub const MAX_SEQUENCE_LEN: usize = u32::MAX as usize;

fn index_value(index: usize) -> Value {
    Value::Number(index as f64)
}

impl RawState {
    fn from_body(body: Body) -> Self {
        Self(Arc::new(RawInner {
            id: TargetId::next(),
            kind: body.kind(),
            data: RwLock::new(RawData {
                properties: IndexMap::new(),
                body,
            }),
        }))
    }

    /// Create an empty record.
    pub fn record() -> Self {
        Self::from_body(Body::Record)
    }

    /// Create a record from named properties.
    pub fn record_from<K, V, I>(properties: I) -> Self
    where
        K: Into<Arc<str>>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let raw = Self::record();
        raw.0.data.write().properties = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        raw
    }

    /// Create an empty sequence.
    pub fn sequence() -> Self {
        Self::from_body(Body::Sequence(Vec::new()))
    }

    pub fn sequence_from<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::from_body(Body::Sequence(items.into_iter().map(Into::into).collect()))
    }

    /// Create an empty set.
    pub fn set() -> Self {
        Self::from_body(Body::Set(IndexSet::new()))
    }

    pub fn set_from<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::from_body(Body::Set(items.into_iter().map(Into::into).collect()))
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Self::from_body(Body::Map(IndexMap::new()))
    }

    pub fn map_from<K, V, I>(entries: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_body(Body::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Create an empty weak set. Members must be containers.
    pub fn weak_set() -> Self {
        Self::from_body(Body::WeakSet(HashMap::new()))
    }

    /// Create an empty weak map. Keys must be containers.
    pub fn weak_map() -> Self {
        Self::from_body(Body::WeakMap(HashMap::new()))
    }

    pub fn id(&self) -> TargetId {
        self.0.id
    }

    pub fn kind(&self) -> ContainerKind {
        self.0.kind
    }

    pub(crate) fn downgrade(&self) -> Weak<RawInner> {
        Arc::downgrade(&self.0)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Read a named property. Missing properties read as `Undefined`.
    pub fn property(&self, key: &str) -> Value {
        self.0
            .data
            .read()
            .properties
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.0.data.read().properties.contains_key(key)
    }

    /// Write a named property, returning the previous value if the property
    /// already existed.
    pub fn set_property(&self, key: &str, value: impl Into<Value>) -> Option<Value> {
        let mut data = self.0.data.write();
        match data.properties.get_mut(key) {
            Some(slot) => Some(std::mem::replace(slot, value.into())),
            None => {
                data.properties.insert(Arc::from(key), value.into());
                None
            }
        }
    }

    /// Remove a named property, returning its value if it existed.
    pub fn delete_property(&self, key: &str) -> Option<Value> {
        self.0.data.write().properties.shift_remove(key)
    }

    pub fn property_keys(&self) -> Vec<Arc<str>> {
        self.0.data.read().properties.keys().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------

    fn with_items<R>(&self, operation: &str, f: impl FnOnce(&Vec<Value>) -> R) -> Result<R> {
        match &self.0.data.read().body {
            Body::Sequence(items) => Ok(f(items)),
            _ => Err(Error::unsupported(operation, self.kind())),
        }
    }

    fn with_items_mut<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Vec<Value>) -> R,
    ) -> Result<R> {
        match &mut self.0.data.write().body {
            Body::Sequence(items) => Ok(f(items)),
            _ => Err(Error::unsupported(operation, self.kind())),
        }
    }

    /// Read the item at `index`; out-of-range reads are `Undefined`.
    pub fn item(&self, index: usize) -> Result<Value> {
        self.with_items("item", |items| items.get(index).cloned().unwrap_or_default())
    }

    /// Write the item at `index`, growing the sequence with `Undefined` holes
    /// when `index` is past the end.
    ///
    /// Returns the previous value, or `None` if the index did not exist.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `index` is at or past
    /// [`MAX_SEQUENCE_LEN`] or the holes cannot be allocated.
    pub fn set_item(&self, index: usize, value: impl Into<Value>) -> Result<Option<Value>> {
        let value = value.into();
        self.with_items_mut("set_item", |items| {
            if let Some(slot) = items.get_mut(index) {
                return Ok(Some(std::mem::replace(slot, value)));
            }
            let new_len = index
                .checked_add(1)
                .filter(|len| *len <= MAX_SEQUENCE_LEN)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!("sequence index {index} is out of range"))
                })?;
            items.try_reserve(new_len - items.len()).map_err(|err| {
                Error::InvalidArgument(format!("cannot grow sequence to index {index}: {err}"))
            })?;
            items.resize(index, Value::Undefined);
            items.push(value);
            Ok(None)
        })?
    }

    /// Append an item, returning the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        let value = value.into();
        self.with_items_mut("push", |items| {
            items.push(value);
            items.len()
        })
    }

    pub fn pop(&self) -> Result<Option<Value>> {
        self.with_items_mut("pop", Vec::pop)
    }

    /// Insert an item at `index`, shifting later items. Indices past the end
    /// append.
    pub fn insert_item(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.with_items_mut("insert_item", |items| {
            let index = index.min(items.len());
            items.insert(index, value);
        })
    }

    /// Remove the item at `index`, shifting later items.
    pub fn remove_item(&self, index: usize) -> Result<Option<Value>> {
        self.with_items_mut("remove_item", |items| {
            (index < items.len()).then(|| items.remove(index))
        })
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// Membership test for sets and weak sets, key test for maps and weak maps.
    pub fn contains(&self, key: &Value) -> Result<bool> {
        match &self.0.data.read().body {
            Body::Set(set) => Ok(set.contains(key)),
            Body::Map(map) => Ok(map.contains_key(key)),
            Body::WeakSet(set) => Ok(key
                .raw_container()
                .is_some_and(|raw| set.contains_key(&raw.id()))),
            Body::WeakMap(map) => Ok(key
                .raw_container()
                .is_some_and(|raw| map.contains_key(&raw.id()))),
            _ => Err(Error::unsupported("contains", self.kind())),
        }
    }

    /// Add a member to a set or weak set. Returns `true` if it was not
    /// already present.
    pub fn add(&self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        match &mut self.0.data.write().body {
            Body::Set(set) => Ok(set.insert(value)),
            Body::WeakSet(set) => {
                let raw = value.raw_container().ok_or_else(|| {
                    Error::InvalidArgument("invalid value used in weak set".into())
                })?;
                set.retain(|_, key| key.strong_count() > 0);
                Ok(set.insert(raw.id(), raw.downgrade()).is_none())
            }
            _ => Err(Error::unsupported("add", self.kind())),
        }
    }

    /// Read the value stored under `key` in a map or weak map.
    pub fn lookup(&self, key: &Value) -> Result<Value> {
        match &self.0.data.read().body {
            Body::Map(map) => Ok(map.get(key).cloned().unwrap_or_default()),
            Body::WeakMap(map) => Ok(key
                .raw_container()
                .and_then(|raw| map.get(&raw.id()))
                .map(|entry| entry.value.clone())
                .unwrap_or_default()),
            _ => Err(Error::unsupported("lookup", self.kind())),
        }
    }

    /// Store `value` under `key` in a map or weak map, returning the previous
    /// value if the key was already present.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let value = value.into();
        match &mut self.0.data.write().body {
            Body::Map(map) => Ok(map.insert(key, value)),
            Body::WeakMap(map) => {
                let raw = key.raw_container().ok_or_else(|| {
                    Error::InvalidArgument("invalid value used as weak map key".into())
                })?;
                map.retain(|_, entry| entry.key.strong_count() > 0);
                Ok(map
                    .insert(
                        raw.id(),
                        WeakEntry {
                            key: raw.downgrade(),
                            value,
                        },
                    )
                    .map(|entry| entry.value))
            }
            _ => Err(Error::unsupported("insert", self.kind())),
        }
    }

    /// Remove a set member or map key. Returns `true` if it was present.
    pub fn remove(&self, key: &Value) -> Result<bool> {
        match &mut self.0.data.write().body {
            Body::Set(set) => Ok(set.shift_remove(key)),
            Body::Map(map) => Ok(map.shift_remove(key).is_some()),
            Body::WeakSet(set) => Ok(key
                .raw_container()
                .is_some_and(|raw| set.remove(&raw.id()).is_some())),
            Body::WeakMap(map) => Ok(key
                .raw_container()
                .is_some_and(|raw| map.remove(&raw.id()).is_some())),
            _ => Err(Error::unsupported("remove", self.kind())),
        }
    }

    /// Empty a sequence, set or map, returning the keys it held before
    /// (indices for sequences).
    pub fn clear(&self) -> Result<Vec<Value>> {
        match &mut self.0.data.write().body {
            Body::Sequence(items) => {
                let keys = (0..items.len()).map(index_value).collect();
                items.clear();
                Ok(keys)
            }
            Body::Set(set) => Ok(set.drain(..).collect()),
            Body::Map(map) => Ok(map.drain(..).map(|(k, _)| k).collect()),
            _ => Err(Error::unsupported("clear", self.kind())),
        }
    }

    // ------------------------------------------------------------------
    // Shared
    // ------------------------------------------------------------------

    /// Number of items, members, entries or (for records) properties.
    pub fn len(&self) -> usize {
        let data = self.0.data.read();
        match &data.body {
            Body::Record => data.properties.len(),
            Body::Sequence(items) => items.len(),
            Body::Set(set) => set.len(),
            Body::Map(map) => map.len(),
            Body::WeakSet(set) => set.values().filter(|key| key.strong_count() > 0).count(),
            Body::WeakMap(map) => map
                .values()
                .filter(|entry| entry.key.strong_count() > 0)
                .count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the keys of a sequence (indices), set (members) or map.
    pub fn keys(&self) -> Result<Vec<Value>> {
        match &self.0.data.read().body {
            Body::Sequence(items) => Ok((0..items.len()).map(index_value).collect()),
            Body::Set(set) => Ok(set.iter().cloned().collect()),
            Body::Map(map) => Ok(map.keys().cloned().collect()),
            _ => Err(Error::unsupported("keys", self.kind())),
        }
    }

    /// Snapshot of the values of a sequence, set or map.
    pub fn values(&self) -> Result<Vec<Value>> {
        match &self.0.data.read().body {
            Body::Sequence(items) => Ok(items.clone()),
            Body::Set(set) => Ok(set.iter().cloned().collect()),
            Body::Map(map) => Ok(map.values().cloned().collect()),
            _ => Err(Error::unsupported("values", self.kind())),
        }
    }

    /// Snapshot of `(key, value)` pairs. Set entries pair each member with
    /// itself.
    pub fn entries(&self) -> Result<Vec<(Value, Value)>> {
        match &self.0.data.read().body {
            Body::Sequence(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, v)| (index_value(i), v.clone()))
                .collect()),
            Body::Set(set) => Ok(set.iter().map(|v| (v.clone(), v.clone())).collect()),
            Body::Map(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            _ => Err(Error::unsupported("entries", self.kind())),
        }
    }

    /// Visit every `(value, key)` pair of a sequence, set or map.
    ///
    /// The callback runs on a snapshot, so it may freely touch the container.
    pub fn for_each(&self, mut f: impl FnMut(&Value, &Value)) -> Result<()> {
        for (key, value) in self.entries()? {
            f(&value, &key);
        }
        Ok(())
    }
}

impl PartialEq for RawState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RawState {}

impl Hash for RawState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for RawState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawState")
            .field("id", &self.0.id.raw())
            .field("kind", &self.0.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = RawState::record();
        let b = RawState::record();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn record_properties() {
        let raw = RawState::record_from([("name", "Bob")]);
        assert_eq!(raw.property("name"), Value::from("Bob"));
        assert!(raw.property("missing").is_undefined());

        assert_eq!(raw.set_property("age", 3), None);
        assert_eq!(raw.set_property("age", 4), Some(Value::from(3)));
        assert_eq!(raw.len(), 2);

        assert_eq!(raw.delete_property("name"), Some(Value::from("Bob")));
        assert_eq!(raw.delete_property("name"), None);
        assert_eq!(raw.property_keys(), vec![Arc::<str>::from("age")]);
    }

    #[test]
    fn sequence_grows_with_holes() {
        let raw = RawState::sequence_from([1, 2]);
        assert_eq!(raw.set_item(4, 5).unwrap(), None);
        assert_eq!(raw.len(), 5);
        assert!(raw.item(2).unwrap().is_undefined());
        assert_eq!(raw.set_item(0, 9).unwrap(), Some(Value::from(1)));
        assert_eq!(raw.pop().unwrap(), Some(Value::from(5)));
        assert_eq!(raw.remove_item(10).unwrap(), None);
    }

    #[test]
    fn sequence_rejects_unbounded_growth() {
        let raw = RawState::sequence_from([1]);
        assert!(raw.set_item(usize::MAX, 2).unwrap_err().is_invalid_argument());
        assert!(raw
            .set_item(MAX_SEQUENCE_LEN, 2)
            .unwrap_err()
            .is_invalid_argument());
        assert_eq!(raw.len(), 1);

        // Existing slots are still writable
        assert_eq!(raw.set_item(0, 3).unwrap(), Some(Value::from(1)));
    }

    #[test]
    fn set_members_are_unique_and_ordered() {
        let raw = RawState::set();
        assert!(raw.add(2).unwrap());
        assert!(raw.add(1).unwrap());
        assert!(!raw.add(2).unwrap());
        assert_eq!(raw.values().unwrap(), vec![Value::from(2), Value::from(1)]);
        assert!(raw.remove(&Value::from(2)).unwrap());
        assert!(!raw.remove(&Value::from(2)).unwrap());
        assert_eq!(raw.clear().unwrap(), vec![Value::from(1)]);
        assert!(raw.is_empty());
    }

    #[test]
    fn map_insert_reports_previous() {
        let raw = RawState::map();
        assert_eq!(raw.insert("a", 1).unwrap(), None);
        assert_eq!(raw.insert("a", 2).unwrap(), Some(Value::from(1)));
        assert_eq!(raw.lookup(&Value::from("a")).unwrap(), Value::from(2));
        assert!(raw.lookup(&Value::from("b")).unwrap().is_undefined());
    }

    #[test]
    fn weak_set_does_not_retain_members() {
        let set = RawState::weak_set();
        let member = RawState::record();
        assert!(set.add(member.clone()).unwrap());
        assert!(set.contains(&Value::from(member.clone())).unwrap());
        assert_eq!(set.len(), 1);

        drop(member);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn weak_collections_reject_primitive_keys() {
        let set = RawState::weak_set();
        assert!(set.add(1).unwrap_err().is_invalid_argument());
        assert!(!set.contains(&Value::from(1)).unwrap());

        let map = RawState::weak_map();
        assert!(map.insert("key", 1).unwrap_err().is_invalid_argument());
        assert!(map.lookup(&Value::from("key")).unwrap().is_undefined());
    }

    #[test]
    fn kind_mismatch_is_invalid_argument() {
        let record = RawState::record();
        assert!(record.add(1).unwrap_err().is_invalid_argument());
        assert!(record.item(0).unwrap_err().is_invalid_argument());
        assert!(RawState::weak_set().values().unwrap_err().is_invalid_argument());
    }
}
