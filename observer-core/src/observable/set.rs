//! Set facade.

use super::{cleared, structural, Observable, TrackedContainer};
use crate::error::Result;
use crate::graph::DependencyKey;
use crate::reactive::OperationKind;
use crate::value::Value;

/// Tracked view of a set. Obtained from [`Observable::as_set`].
///
/// Membership tests depend on the member tested, `len` on the size and
/// enumeration on the iteration sentinel. Members are compared with
/// [`Value`] equality; observables are looked up by their raw container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableSet(pub(super) Observable);

impl ObservableSet {
    pub fn into_observable(self) -> Observable {
        self.0
    }

    pub fn contains(&self, value: &Value) -> bool {
        let value = value.clone().into_raw();
        self.0
            .track(DependencyKey::element(&value), OperationKind::Has);
        self.0.raw().contains(&value).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.track(DependencyKey::Size, OperationKind::Iterate);
        self.0.raw().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every member, in insertion order.
    pub fn values(&self) -> Vec<Value> {
        self.0.track(DependencyKey::Iteration, OperationKind::Iterate);
        self.0
            .raw()
            .values()
            .unwrap_or_default()
            .into_iter()
            .map(|value| self.0.wrap_nested(value))
            .collect()
    }

    /// Same as [`ObservableSet::values`].
    pub fn keys(&self) -> Vec<Value> {
        self.values()
    }

    /// Every member paired with itself.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.values()
            .into_iter()
            .map(|value| (value.clone(), value))
            .collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.values().into_iter()
    }

    pub fn for_each(&self, mut f: impl FnMut(Value)) {
        for value in self.values() {
            f(value);
        }
    }

    /// Add a member. Returns `false` (and triggers nothing) if it was
    /// already present.
    pub fn add(&self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into().into_raw();
        if !self.0.raw().add(value.clone())? {
            return Ok(false);
        }
        self.0
            .trigger(OperationKind::Add, &structural(DependencyKey::element(&value)))?;
        Ok(true)
    }

    /// Remove a member. Returns `false` (and triggers nothing) if it was not
    /// present.
    pub fn remove(&self, value: &Value) -> Result<bool> {
        let value = value.clone().into_raw();
        if !self.0.raw().remove(&value)? {
            return Ok(false);
        }
        self.0.trigger(
            OperationKind::Delete,
            &structural(DependencyKey::element(&value)),
        )?;
        Ok(true)
    }

    /// Remove every member. Clearing an empty set triggers nothing.
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

impl TrackedContainer for ObservableSet {
    fn observable(&self) -> &Observable {
        &self.0
    }
}

impl IntoIterator for &ObservableSet {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
