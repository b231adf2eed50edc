//! Observer Core
//!
//! This crate provides transparent reactivity over plain state containers.
//! It implements:
//!
//! - Observable wrappers around records, sequences, sets, maps and weak
//!   collections
//! - Reactions that rerun automatically when state they read changes
//! - Fine-grained dependency tracking per property, index, element, size and
//!   key set
//! - Pluggable scheduling of reruns, and per-reaction debug hooks
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: the dynamic [`Value`] model and its equality rules
//! - `raw`: untracked containers ([`RawState`])
//! - `observable`: tracked facades over raw containers
//! - `reactive`: the [`Runtime`], reactions and operation events
//! - `graph`: dependency keys, the dependency graph and schedulers
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use observer_core::{RawState, Runtime, TrackedContainer, Value};
//!
//! let runtime = Runtime::new();
//! let counter = runtime.wrap(&RawState::record_from([("num", 0)]));
//! let seen = Arc::new(Mutex::new(Value::Undefined));
//!
//! let (c, s) = (counter.clone(), seen.clone());
//! runtime.observe(move || {
//!     *s.lock() = c.get_property("num");
//!     Ok(())
//! })?;
//!
//! counter.set_property("num", 7)?;
//! assert_eq!(*seen.lock(), Value::from(7));
//! # Ok::<(), observer_core::Error>(())
//! ```

pub mod error;
pub mod graph;
pub mod observable;
pub mod raw;
pub mod reactive;
pub mod value;

pub use error::{Error, Result};
pub use graph::{DependencyKey, QueueScheduler, Scheduler};
pub use observable::{
    Observable, ObservableMap, ObservableSequence, ObservableSet, ObservableWeakMap,
    ObservableWeakSet, TrackedContainer,
};
pub use raw::{ContainerKind, RawState, TargetId};
pub use reactive::{raw, ObserveOptions, Operation, OperationKind, Reaction, ReactionId, Runtime};
pub use value::Value;
