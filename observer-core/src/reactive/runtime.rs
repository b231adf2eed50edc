//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects observables and
//! reactions. It owns the identity registry, the dependency graph and the
//! active reaction stack.
//!
//! # How It Works
//!
//! 1. Wrapping a raw container yields its (unique) observable.
//!
//! 2. When a reaction reads through an observable, the runtime records a
//!    dependency between the reaction on top of the stack and the facet read.
//!
//! 3. When a write through an observable changes state, the runtime:
//!    a. Finds every reaction depending on the affected facets
//!    b. Hands each one to its scheduler, or
//!    c. Reruns it synchronously, before the write returns
//!
//! # Ownership
//!
//! There is no global state. Each [`Runtime`] is an independent world;
//! observables and reactions only hold weak references back to it. Dropping
//! the last `Runtime` handle tears everything down: observables keep working
//! as plain accessors, and reactions refuse to run.
//!
//! # Thread Safety
//!
//! The runtime is `Send + Sync` and serializes access to its shared
//! structures, but propagation assumes one logical thread of mutation at a
//! time.

use std::sync::Arc;

use parking_lot::Mutex;

use super::context::ActiveStack;
use super::operation::{Operation, OperationKind};
use super::reaction::{ObserveOptions, Reaction};
use super::registry::IdentityRegistry;
use crate::error::{Error, Result};
use crate::graph::{DependencyGraph, DependencyKey};
use crate::observable::Observable;
use crate::raw::{RawState, TargetId};
use crate::value::Value;

/// A reactive runtime.
///
/// Cloning yields another handle to the same runtime.
#[derive(Clone, Default)]
pub struct Runtime(Arc<RuntimeInner>);

pub(crate) struct RuntimeInner {
    pub(crate) registry: IdentityRegistry,
    pub(crate) graph: Mutex<DependencyGraph>,
    pub(crate) stack: ActiveStack,
}

impl Default for RuntimeInner {
    fn default() -> Self {
        Self {
            registry: IdentityRegistry::new(),
            graph: Mutex::new(DependencyGraph::new()),
            stack: ActiveStack::new(),
        }
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `value` observable.
    ///
    /// - `Undefined` yields a new observable over a fresh, empty record.
    /// - A raw container yields its observable, created on first request.
    /// - An observable, `Null` or a boolean is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for numbers and strings, which have no
    /// identity to observe.
    pub fn observable(&self, value: impl Into<Value>) -> Result<Value> {
        match value.into() {
            Value::Undefined => Ok(Value::Observable(self.wrap(&RawState::record()))),
            Value::Object(raw) => Ok(Value::Observable(self.wrap(&raw))),
            Value::Number(n) => Err(Error::InvalidArgument(format!(
                "cannot observe the number {n}"
            ))),
            Value::String(s) => Err(Error::InvalidArgument(format!(
                "cannot observe the string {s:?}"
            ))),
            value @ (Value::Observable(_) | Value::Null | Value::Bool(_)) => Ok(value),
        }
    }

    /// The observable for `raw`, created on first request.
    pub fn wrap(&self, raw: &RawState) -> Observable {
        self.0.registry.observable_for(raw, &Arc::downgrade(&self.0))
    }

    /// Whether `value` is an observable created by this runtime.
    pub fn is_observable(&self, value: &Value) -> bool {
        value
            .as_observable()
            .is_some_and(|obs| self.0.registry.contains(obs))
    }

    /// Run `f` now and again whenever state it read changes.
    ///
    /// `f` runs once, synchronously, before `observe` returns. If that first
    /// run fails, the error is returned; dependencies recorded before the
    /// failure stay in place.
    pub fn observe<F, T>(&self, f: F) -> Result<Reaction>
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
        T: Into<Value>,
    {
        self.observe_with(f, ObserveOptions::default())
    }

    /// Like [`Runtime::observe`], with a scheduler and/or debugger.
    ///
    /// The first run is always synchronous, even with a scheduler.
    pub fn observe_with<F, T>(&self, f: F, options: ObserveOptions) -> Result<Reaction>
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
        T: Into<Value>,
    {
        let reaction = Reaction::new(
            Arc::downgrade(&self.0),
            Box::new(move || f().map(Into::into)),
            options,
        );
        tracing::debug!(
            reaction = ?reaction.id(),
            scheduled = reaction.scheduler().is_some(),
            "reaction.observed"
        );
        reaction.run()?;
        Ok(reaction)
    }

    /// Stop `reaction`: remove all of its dependencies, cancel pending
    /// scheduled runs and reject any further run. Unobserving twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `reaction` was created by another runtime.
    pub fn unobserve(&self, reaction: &Reaction) -> Result<()> {
        if !reaction.belongs_to(&self.0) {
            return Err(Error::InvalidArgument(format!(
                "reaction {} was not created by this runtime",
                reaction.id().raw()
            )));
        }
        if !reaction.mark_stopped() {
            return Ok(());
        }

        self.0.unlink_all(reaction);
        if let Some(scheduler) = reaction.scheduler() {
            scheduler.delete(reaction);
        }
        tracing::debug!(reaction = ?reaction.id(), "reaction.unobserved");
        Ok(())
    }

    /// The reaction currently running, if any.
    pub fn current_reaction(&self) -> Option<Reaction> {
        self.0.stack.current()
    }

    /// Whether reads right now would be tracked.
    pub fn is_tracking(&self) -> bool {
        self.0.stack.is_active()
    }

    /// Number of reactions whose last run read `key` of `observable`.
    pub fn dependent_count(&self, observable: &Observable, key: &DependencyKey) -> usize {
        self.0.graph.lock().dependents(observable.raw().id(), key)
    }

    /// Forget registry entries whose observable has been dropped.
    pub fn sweep(&self) -> usize {
        self.0.registry.sweep()
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Arc<RuntimeInner> {
        &self.0
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("observables", &self.0.registry.len())
            .field("tracked_targets", &self.0.graph.lock().target_count())
            .field("depth", &self.0.stack.depth())
            .finish()
    }
}

/// The raw value behind `value`.
///
/// Observables yield their raw container; anything else is returned as is.
pub fn raw(value: &Value) -> Value {
    value.clone().into_raw()
}

impl RuntimeInner {
    /// Attribute a read of `(target, key)` to the running reaction, if any.
    pub(crate) fn track(&self, target: TargetId, key: DependencyKey, kind: OperationKind) {
        let Some(reaction) = self.stack.current() else {
            return;
        };
        // A reaction may unobserve itself mid-run; it must not relink.
        if reaction.is_stopped() {
            return;
        }

        self.graph.lock().link(target, key.clone(), &reaction);
        reaction.record_link((target, key.clone()));
        tracing::trace!(
            reaction = ?reaction.id(),
            target_id = ?target,
            key = %key,
            ?kind,
            "dependency.tracked"
        );
        reaction.debug(&Operation { kind, target, key });
    }

    /// Rerun every reaction depending on any of `keys` of `target`.
    ///
    /// `keys` lists the most specific key first; it is the one reported to
    /// debuggers.
    pub(crate) fn trigger(
        &self,
        target: TargetId,
        kind: OperationKind,
        keys: &[DependencyKey],
    ) -> Result<()> {
        let Some(primary) = keys.first() else {
            return Ok(());
        };
        let selected = self.graph.lock().reactions_for(target, keys);
        if selected.is_empty() {
            return Ok(());
        }

        tracing::trace!(
            target_id = ?target,
            key = %primary,
            ?kind,
            reactions = selected.len(),
            "dependency.triggered"
        );
        let operation = Operation {
            kind,
            target,
            key: primary.clone(),
        };
        for reaction in &selected {
            // An earlier rerun in the same trigger may have unobserved it.
            if reaction.is_stopped() {
                continue;
            }
            reaction.debug(&operation);
            self.rerun(reaction)?;
        }
        Ok(())
    }

    fn rerun(&self, reaction: &Reaction) -> Result<()> {
        match reaction.scheduler() {
            Some(scheduler) => {
                tracing::trace!(reaction = ?reaction.id(), "reaction.scheduled");
                scheduler.add(reaction);
                Ok(())
            }
            None => reaction.run().map(drop),
        }
    }

    /// Remove every dependency `reaction` recorded.
    pub(crate) fn unlink_all(&self, reaction: &Reaction) {
        let links = reaction.take_links();
        if !links.is_empty() {
            self.graph.lock().unlink(reaction.id(), links);
        }
    }

    /// Wrap container values handed out by a facade.
    pub(crate) fn wrap_value(self: &Arc<Self>, value: Value) -> Value {
        match value {
            Value::Object(raw) => {
                Value::Observable(self.registry.observable_for(&raw, &Arc::downgrade(self)))
            }
            other => other,
        }
    }
}
