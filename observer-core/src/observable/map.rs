//! Map facade.

use super::{cleared, structural, Observable, TrackedContainer};
use crate::error::Result;
use crate::graph::DependencyKey;
use crate::reactive::OperationKind;
use crate::value::Value;

/// Tracked view of a map. Obtained from [`Observable::as_map`].
///
/// Lookups depend on the key looked up. Enumerating keys depends on the
/// iteration sentinel only; enumerating values or entries also depends on
/// each key yielded, so overwriting a value reruns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableMap(pub(super) Observable);

impl ObservableMap {
    pub fn into_observable(self) -> Observable {
        self.0
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        let key = key.clone().into_raw();
        self.0.track(DependencyKey::element(&key), OperationKind::Has);
        self.0.raw().contains(&key).unwrap_or(false)
    }

    /// Read the value under `key`. Missing keys read as `Undefined`.
    pub fn get(&self, key: &Value) -> Value {
        let key = key.clone().into_raw();
        self.0.track(DependencyKey::element(&key), OperationKind::Get);
        self.0
            .wrap_nested(self.0.raw().lookup(&key).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.0.track(DependencyKey::Size, OperationKind::Iterate);
        self.0.raw().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every key, in insertion order.
    pub fn keys(&self) -> Vec<Value> {
        self.0.track(DependencyKey::Iteration, OperationKind::Iterate);
        self.0
            .raw()
            .keys()
            .unwrap_or_default()
            .into_iter()
            .map(|key| self.0.wrap_nested(key))
            .collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries().into_iter().map(|(_, value)| value).collect()
    }

    /// Snapshot of every `(key, value)` pair, in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0.track(DependencyKey::Iteration, OperationKind::Iterate);
        self.0
            .raw()
            .entries()
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| {
                self.0.track(DependencyKey::element(&key), OperationKind::Get);
                (self.0.wrap_nested(key), self.0.wrap_nested(value))
            })
            .collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<(Value, Value)> {
        self.entries().into_iter()
    }

    /// Visit every `(value, key)` pair.
    pub fn for_each(&self, mut f: impl FnMut(Value, Value)) {
        for (key, value) in self.entries() {
            f(value, key);
        }
    }

    /// Store `value` under `key`.
    ///
    /// A new key triggers its readers, enumerators and size readers; an
    /// existing key triggers only readers of that key, and only if the value
    /// changed.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        let key = key.into().into_raw();
        let value = value.into().into_raw();
        match self.0.raw().insert(key.clone(), value.clone())? {
            None => self
                .0
                .trigger(OperationKind::Add, &structural(DependencyKey::element(&key))),
            Some(previous) if previous != value => self
                .0
                .trigger(OperationKind::Set, &[DependencyKey::element(&key)]),
            Some(_) => Ok(()),
        }
    }

    /// Remove `key`. Returns `false` (and triggers nothing) if it was not
    /// present.
    pub fn remove(&self, key: &Value) -> Result<bool> {
        let key = key.clone().into_raw();
        if !self.0.raw().remove(&key)? {
            return Ok(false);
        }
        self.0.trigger(
            OperationKind::Delete,
            &structural(DependencyKey::element(&key)),
        )?;
        Ok(true)
    }

    /// Remove every entry. Clearing an empty map triggers nothing.
    pub fn clear(&self) -> Result<()> {
        let previous = self.0.raw().clear()?;
        if previous.is_empty() {
            return Ok(());
        }
        self.0.trigger(
            OperationKind::Clear,
            &cleared(previous.iter().map(DependencyKey::element)),
        )
    }
}

impl TrackedContainer for ObservableMap {
    fn observable(&self) -> &Observable {
        &self.0
    }
}

impl IntoIterator for &ObservableMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
