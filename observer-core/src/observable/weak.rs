//! Weak collection facades.
//!
//! Weak collections only accept containers as members or keys and never keep
//! them alive. They cannot be enumerated or sized, so only membership and
//! lookup are tracked.

use super::{structural, Observable, TrackedContainer};
use crate::error::Result;
use crate::graph::DependencyKey;
use crate::reactive::OperationKind;
use crate::value::Value;

/// Tracked view of a weak set. Obtained from [`Observable::as_weak_set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableWeakSet(pub(super) Observable);

impl ObservableWeakSet {
    pub fn into_observable(self) -> Observable {
        self.0
    }

    /// Whether `value` is a live member. Non-containers never are.
    pub fn contains(&self, value: &Value) -> bool {
        self.0
            .track(DependencyKey::element(value), OperationKind::Has);
        self.0.raw().contains(value).unwrap_or(false)
    }

    /// Add a container. Returns `false` if it was already a member.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `value`
    /// is not a container.
    pub fn add(&self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into().into_raw();
        if !self.0.raw().add(value.clone())? {
            return Ok(false);
        }
        self.0
            .trigger(OperationKind::Add, &structural(DependencyKey::element(&value)))?;
        Ok(true)
    }

    pub fn remove(&self, value: &Value) -> Result<bool> {
        if !self.0.raw().remove(value)? {
            return Ok(false);
        }
        self.0.trigger(
            OperationKind::Delete,
            &structural(DependencyKey::element(value)),
        )?;
        Ok(true)
    }
}

impl TrackedContainer for ObservableWeakSet {
    fn observable(&self) -> &Observable {
        &self.0
    }
}

/// Tracked view of a weak map. Obtained from [`Observable::as_weak_map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableWeakMap(pub(super) Observable);

impl ObservableWeakMap {
    pub fn into_observable(self) -> Observable {
        self.0
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.track(DependencyKey::element(key), OperationKind::Has);
        self.0.raw().contains(key).unwrap_or(false)
    }

    pub fn get(&self, key: &Value) -> Value {
        self.0.track(DependencyKey::element(key), OperationKind::Get);
        self.0.wrap_nested(self.0.raw().lookup(key).unwrap_or_default())
    }

    /// Store `value` under the container `key`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `key` is
    /// not a container.
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

    pub fn remove(&self, key: &Value) -> Result<bool> {
        if !self.0.raw().remove(key)? {
            return Ok(false);
        }
        self.0.trigger(
            OperationKind::Delete,
            &structural(DependencyKey::element(key)),
        )?;
        Ok(true)
    }
}

impl TrackedContainer for ObservableWeakMap {
    fn observable(&self) -> &Observable {
        &self.0
    }
}
