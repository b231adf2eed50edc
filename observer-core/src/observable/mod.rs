//! Observables
//!
//! An [`Observable`] is the tracked facade over a raw container. Native
//! syntax cannot be intercepted in Rust, so every access goes through
//! explicit accessor methods:
//!
//! - [`TrackedContainer`]: named properties, available on every kind (for
//!   records these are the data; for the other kinds, custom properties)
//! - [`ObservableSequence`], [`ObservableSet`], [`ObservableMap`]: the data
//!   of sequences, sets and maps
//! - [`ObservableWeakSet`], [`ObservableWeakMap`]: membership and lookup on
//!   non-retaining collections, without iteration or size
//!
//! Every read registers a dependency with the running reaction (if any) and
//! every effective write triggers the reactions depending on what changed.
//! Containers read through a facade come back wrapped, so chained access
//! stays tracked; values written through a facade are stored raw, so
//! wrappers never leak into raw state.

mod map;
mod record;
mod sequence;
mod set;
mod weak;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

pub use map::ObservableMap;
pub use record::TrackedContainer;
pub use sequence::ObservableSequence;
pub use set::ObservableSet;
pub use weak::{ObservableWeakMap, ObservableWeakSet};

use crate::error::Result;
use crate::graph::DependencyKey;
use crate::raw::{ContainerKind, RawState};
use crate::reactive::{OperationKind, RuntimeInner};
use crate::value::Value;

/// Tracked wrapper around a raw container.
///
/// There is at most one live observable per container and runtime, so two
/// observables are equal exactly when they are the same wrapper.
#[derive(Clone)]
pub struct Observable(Arc<ObservableInner>);

pub(crate) struct ObservableInner {
    raw: RawState,
    runtime: Weak<RuntimeInner>,
}

impl Observable {
    pub(crate) fn new(raw: RawState, runtime: Weak<RuntimeInner>) -> Self {
        Self(Arc::new(ObservableInner { raw, runtime }))
    }

    pub(crate) fn from_inner(inner: Arc<ObservableInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ObservableInner> {
        Arc::downgrade(&self.0)
    }

    /// Whether `weak` points at this wrapper.
    pub(crate) fn is(&self, weak: &Weak<ObservableInner>) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.0), weak.as_ptr())
    }

    /// The raw container behind this wrapper.
    pub fn raw(&self) -> &RawState {
        &self.0.raw
    }

    pub fn kind(&self) -> ContainerKind {
        self.0.raw.kind()
    }

    pub fn as_sequence(&self) -> Option<ObservableSequence> {
        (self.kind() == ContainerKind::Sequence).then(|| ObservableSequence(self.clone()))
    }

    pub fn as_set(&self) -> Option<ObservableSet> {
        (self.kind() == ContainerKind::Set).then(|| ObservableSet(self.clone()))
    }

    pub fn as_map(&self) -> Option<ObservableMap> {
        (self.kind() == ContainerKind::Map).then(|| ObservableMap(self.clone()))
    }

    pub fn as_weak_set(&self) -> Option<ObservableWeakSet> {
        (self.kind() == ContainerKind::WeakSet).then(|| ObservableWeakSet(self.clone()))
    }

    pub fn as_weak_map(&self) -> Option<ObservableWeakMap> {
        (self.kind() == ContainerKind::WeakMap).then(|| ObservableWeakMap(self.clone()))
    }

    fn runtime(&self) -> Option<Arc<RuntimeInner>> {
        self.0.runtime.upgrade()
    }

    /// Register a read of `key` with the running reaction.
    pub(crate) fn track(&self, key: DependencyKey, kind: OperationKind) {
        if let Some(runtime) = self.runtime() {
            runtime.track(self.0.raw.id(), key, kind);
        }
    }

    /// Rerun reactions depending on any of `keys`.
    pub(crate) fn trigger(&self, kind: OperationKind, keys: &[DependencyKey]) -> Result<()> {
        match self.runtime() {
            Some(runtime) => runtime.trigger(self.0.raw.id(), kind, keys),
            None => Ok(()),
        }
    }

    /// Wrap a container value before handing it to the caller.
    pub(crate) fn wrap_nested(&self, value: Value) -> Value {
        match self.runtime() {
            Some(runtime) => runtime.wrap_value(value),
            None => value,
        }
    }
}

impl TrackedContainer for Observable {
    fn observable(&self) -> &Observable {
        self
    }
}

impl PartialEq for Observable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Observable {}

impl Hash for Observable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("target", &self.0.raw.id().raw())
            .field("kind", &self.0.raw.kind())
            .finish()
    }
}

/// Keys touched when a collection gains or loses `key`.
fn structural(key: DependencyKey) -> [DependencyKey; 3] {
    [key, DependencyKey::Iteration, DependencyKey::Size]
}

/// Keys touched when a collection holding `previous` keys is emptied.
fn cleared(previous: impl IntoIterator<Item = DependencyKey>) -> Vec<DependencyKey> {
    [DependencyKey::Iteration, DependencyKey::Size]
        .into_iter()
        .chain(previous)
        .collect()
}
