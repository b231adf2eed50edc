//! Dependency Store
//!
//! Two-level association from raw targets to the reactions that read them:
//!
//! ```text
//! TargetId -> DependencyKey -> { Reaction, ... }
//! ```
//!
//! The store only ever holds target ids, never the containers themselves,
//! so a container that nothing else references can be freed even while
//! reactions still depend on it.
//!
//! Each reaction keeps its own copy of the links it created (see
//! [`Reaction`]), which is what makes `unlink` cheap: we only visit the
//! buckets the reaction is actually in.

use std::collections::HashMap;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::key::{DependencyKey, Link};
use crate::raw::TargetId;
use crate::reactive::{Reaction, ReactionId};

type Bucket = IndexMap<ReactionId, Reaction>;

/// Reactions selected by a single trigger, de-duplicated.
pub(crate) type Selected = SmallVec<[Reaction; 4]>;

#[derive(Default)]
pub(crate) struct DependencyGraph {
    targets: HashMap<TargetId, HashMap<DependencyKey, Bucket>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `reaction` depends on `(target, key)`.
    ///
    /// Returns `false` if the link already existed.
    pub fn link(&mut self, target: TargetId, key: DependencyKey, reaction: &Reaction) -> bool {
        self.targets
            .entry(target)
            .or_default()
            .entry(key)
            .or_default()
            .insert(reaction.id(), reaction.clone())
            .is_none()
    }

    /// Collect every reaction depending on any of `keys` of `target`.
    ///
    /// Each reaction appears once, in the order it first linked to the
    /// earliest matching key.
    pub fn reactions_for(&self, target: TargetId, keys: &[DependencyKey]) -> Selected {
        let Some(by_key) = self.targets.get(&target) else {
            return Selected::new();
        };

        let mut selected: IndexMap<ReactionId, &Reaction> = IndexMap::new();
        for bucket in keys.iter().filter_map(|key| by_key.get(key)) {
            for (id, reaction) in bucket {
                selected.entry(*id).or_insert(reaction);
            }
        }
        selected.into_values().cloned().collect()
    }

    /// Remove `reaction` from every bucket named by `links`, pruning buckets
    /// and targets left empty.
    pub fn unlink(&mut self, reaction: ReactionId, links: impl IntoIterator<Item = Link>) {
        for (target, key) in links {
            let Some(by_key) = self.targets.get_mut(&target) else {
                continue;
            };
            if let Some(bucket) = by_key.get_mut(&key) {
                bucket.shift_remove(&reaction);
                if bucket.is_empty() {
                    by_key.remove(&key);
                }
            }
            if by_key.is_empty() {
                self.targets.remove(&target);
            }
        }
    }

    /// Number of reactions depending on `(target, key)`.
    pub fn dependents(&self, target: TargetId, key: &DependencyKey) -> usize {
        self.targets
            .get(&target)
            .and_then(|by_key| by_key.get(key))
            .map_or(0, Bucket::len)
    }

    /// Number of targets with at least one dependent.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}
