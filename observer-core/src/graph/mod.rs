//! Dependency Graph
//!
//! This module implements the graph that relates raw state to the reactions
//! reading it.
//!
//! # Overview
//!
//! - A dependency is a `(target, key)` pair: a raw container and the facet
//!   of it that was read ([`DependencyKey`]).
//! - The graph maps every dependency to the set of reactions that read it
//!   during their last run.
//! - When a facet changes, the graph yields the reactions to rerun; the
//!   reactions themselves decide whether to run now or hand the rerun to a
//!   [`Scheduler`].
//!
//! # Design Decisions
//!
//! 1. The graph is keyed by target id, not by container, so it never keeps
//!    observed state alive.
//!
//! 2. Links are stored twice: in the graph for lookup by dependency, and in
//!    each reaction for cleanup. Rerunning a reaction first removes all of
//!    its links, then rebuilds them from the reads of the new run.

mod dependencies;
mod key;
mod scheduler;

pub(crate) use dependencies::DependencyGraph;
pub use key::{DependencyKey, Link};
pub use scheduler::{QueueScheduler, Scheduler};
