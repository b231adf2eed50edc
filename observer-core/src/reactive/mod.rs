//! Reactions and the Runtime
//!
//! This module implements the dependency-tracking core: the runtime that owns
//! all shared state, and the reactions it runs.
//!
//! # Concepts
//!
//! ## Runtime
//!
//! A [`Runtime`] is an explicit context object. It hands out observables,
//! registers reactions and routes every tracked read and triggering write.
//! Nothing is global: two runtimes never see each other's reactions.
//!
//! ## Reactions
//!
//! A [`Reaction`] is a user function that is run once when observed and then
//! again whenever state it read changes. Its dependencies are rebuilt from
//! scratch on every run.
//!
//! ## Scheduling
//!
//! Reruns are synchronous by default. A reaction observed with a
//! [`Scheduler`](crate::graph::Scheduler) has its reruns submitted to the
//! scheduler instead.
//!
//! # Implementation Notes
//!
//! Reads are attributed through a stack of running reactions. When an
//! observable is read, we check whether a reaction is running and, if so,
//! link the read facet to the reaction on top of the stack.
//!
//! This approach (sometimes called "transparent reactivity") is the one used
//! by MobX and Vue 3.

mod context;
mod operation;
mod reaction;
mod registry;
mod runtime;

pub use operation::{Debugger, Operation, OperationKind};
pub use reaction::{ObserveOptions, Reaction, ReactionId};
pub use runtime::{raw, Runtime};
pub(crate) use runtime::RuntimeInner;
