//! Identity Registry
//!
//! Maps raw containers to their observable wrapper, so that wrapping the same
//! container twice yields the same observable.
//!
//! Entries are keyed by [`TargetId`] and hold the wrapper weakly: the
//! registry never keeps a wrapper (or, through it, a container) alive. An
//! entry whose wrapper is gone is replaced on the next wrap and swept
//! periodically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Weak;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::runtime::RuntimeInner;
use crate::observable::{Observable, ObservableInner};
use crate::raw::{RawState, TargetId};

/// Number of wrapper creations between sweeps of dead entries.
const SWEEP_INTERVAL: usize = 256;

#[derive(Default)]
pub(crate) struct IdentityRegistry {
    entries: DashMap<TargetId, Weak<ObservableInner>>,
    created: AtomicUsize,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapper for `raw`, created on first request.
    pub fn observable_for(&self, raw: &RawState, runtime: &Weak<RuntimeInner>) -> Observable {
        let observable = match self.entries.entry(raw.id()) {
            Entry::Occupied(mut entry) => {
                if let Some(inner) = entry.get().upgrade() {
                    return Observable::from_inner(inner);
                }
                let observable = Observable::new(raw.clone(), runtime.clone());
                entry.insert(observable.downgrade());
                observable
            }
            Entry::Vacant(entry) => {
                let observable = Observable::new(raw.clone(), runtime.clone());
                entry.insert(observable.downgrade());
                observable
            }
        };

        tracing::trace!(target_id = ?raw.id(), kind = %raw.kind(), "registry.wrapper.created");
        if self.created.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep();
        }
        observable
    }

    /// Whether `observable` is the live wrapper this registry handed out for
    /// its container.
    pub fn contains(&self, observable: &Observable) -> bool {
        self.entries
            .get(&observable.raw().id())
            .is_some_and(|entry| observable.is(entry.value()))
    }

    /// Drop entries whose wrapper no longer exists. Returns how many were
    /// removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, wrapper| wrapper.strong_count() > 0);
        let removed = before.saturating_sub(self.entries.len());
        tracing::debug!(removed, remaining = self.entries.len(), "registry.swept");
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_container_same_wrapper() {
        let registry = IdentityRegistry::new();
        let raw = RawState::record();

        let first = registry.observable_for(&raw, &Weak::new());
        let second = registry.observable_for(&raw, &Weak::new());
        assert_eq!(first, second);
        assert!(registry.contains(&first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_containers_distinct_wrappers() {
        let registry = IdentityRegistry::new();
        let a = registry.observable_for(&RawState::record(), &Weak::new());
        let b = registry.observable_for(&RawState::record(), &Weak::new());
        assert_ne!(a, b);
    }

    #[test]
    fn foreign_wrappers_are_not_contained() {
        let ours = IdentityRegistry::new();
        let theirs = IdentityRegistry::new();
        let raw = RawState::record();

        let foreign = theirs.observable_for(&raw, &Weak::new());
        assert!(!ours.contains(&foreign));
    }

    #[test]
    fn dead_entries_are_replaced_and_swept() {
        let registry = IdentityRegistry::new();
        let raw = RawState::record();

        drop(registry.observable_for(&raw, &Weak::new()));
        assert_eq!(registry.sweep(), 1);
        assert_eq!(registry.len(), 0);

        drop(registry.observable_for(&raw, &Weak::new()));
        let live = registry.observable_for(&raw, &Weak::new());
        assert!(registry.contains(&live));
        assert_eq!(registry.len(), 1);
    }
}
