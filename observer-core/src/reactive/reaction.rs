//! Reaction Implementation
//!
//! A Reaction is a user function that reruns whenever state it read during
//! its last run changes.
//!
//! # How Reactions Work
//!
//! 1. When observed, the reaction runs its function immediately to establish
//!    initial dependencies. This happens even if a scheduler is configured.
//!
//! 2. When any dependency changes, the reaction reruns: synchronously, or by
//!    being handed to its [`Scheduler`].
//!
//! 3. Before each run, the reaction drops all of its old dependencies and
//!    collects new ones during execution, so branches not taken this time
//!    stop triggering it.
//!
//! # Re-entrancy
//!
//! A reaction that writes state it also reads would trigger itself while
//! running. The `running` flag turns such nested runs into no-ops; the
//! write is still visible to the next run.
//!
//! # Stopping
//!
//! Once unobserved, a reaction has no dependencies left and every direct
//! [`Reaction::run`] fails with [`Error::InvalidState`].

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::operation::{Debugger, Operation};
use super::runtime::RuntimeInner;
use crate::error::{Error, Result};
use crate::graph::{Link, Scheduler};
use crate::value::Value;

/// Unique identifier for a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionId(u64);

impl ReactionId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

type ReactionFn = Box<dyn Fn() -> Result<Value> + Send + Sync>;

/// Options accepted by [`Runtime::observe_with`](super::Runtime::observe_with).
#[derive(Clone, Default)]
pub struct ObserveOptions {
    scheduler: Option<Arc<dyn Scheduler>>,
    debugger: Option<Debugger>,
}

impl ObserveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit reruns to `scheduler` instead of running them synchronously.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Call `debugger` for every read and trigger that concerns the reaction.
    pub fn debugger<F>(mut self, debugger: F) -> Self
    where
        F: Fn(&Operation) + Send + Sync + 'static,
    {
        self.debugger = Some(Arc::new(debugger));
        self
    }
}

impl fmt::Debug for ObserveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserveOptions")
            .field("scheduler", &self.scheduler.is_some())
            .field("debugger", &self.debugger.is_some())
            .finish()
    }
}

#[derive(Default)]
struct ReactionState {
    /// Dependencies recorded during the current or last run.
    links: HashSet<Link>,
    stopped: bool,
    running: bool,
    run_count: usize,
}

struct ReactionInner {
    id: ReactionId,
    runtime: Weak<RuntimeInner>,
    run: ReactionFn,
    scheduler: Option<Arc<dyn Scheduler>>,
    debugger: Option<Debugger>,
    state: Mutex<ReactionState>,
}

/// Handle to an observed function.
///
/// Handles are cheap to clone; clones refer to the same reaction.
#[derive(Clone)]
pub struct Reaction(Arc<ReactionInner>);

impl Reaction {
    pub(crate) fn new(runtime: Weak<RuntimeInner>, run: ReactionFn, options: ObserveOptions) -> Self {
        Self(Arc::new(ReactionInner {
            id: ReactionId::next(),
            runtime,
            run,
            scheduler: options.scheduler,
            debugger: options.debugger,
            state: Mutex::new(ReactionState::default()),
        }))
    }

    /// A reaction not attached to any runtime. It can be stacked, linked and
    /// scheduled, but never run.
    #[cfg(test)]
    pub(crate) fn detached<F>(run: F, options: ObserveOptions) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(Weak::new(), Box::new(run), options)
    }

    pub fn id(&self) -> ReactionId {
        self.0.id
    }

    /// Run the reaction now, rebuilding its dependencies.
    ///
    /// Returns whatever the reaction's function returns. A reaction that is
    /// already running is not run again; the nested call returns
    /// `Ok(Value::Undefined)`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if the reaction was unobserved or its runtime
    /// has been dropped. Errors of the function itself are returned as-is.
    pub fn run(&self) -> Result<Value> {
        let runtime = self.0.runtime.upgrade().ok_or_else(|| {
            Error::InvalidState(format!(
                "reaction {} outlived the runtime that created it",
                self.0.id.raw()
            ))
        })?;

        if !self.begin_run()? {
            tracing::trace!(reaction = ?self.0.id, "reaction.run.skipped_reentrant");
            return Ok(Value::Undefined);
        }

        runtime.unlink_all(self);
        let _guard = runtime.stack.enter(self.clone());
        tracing::trace!(
            reaction = ?self.0.id,
            depth = runtime.stack.depth(),
            "reaction.run"
        );
        (self.0.run)()
    }

    /// Whether the reaction has been unobserved.
    pub fn is_stopped(&self) -> bool {
        self.0.state.lock().stopped
    }

    /// Whether the reaction is currently executing.
    pub fn is_running(&self) -> bool {
        self.0.state.lock().running
    }

    /// Number of runs that have finished, including the initial one and
    /// runs that returned an error. Skipped re-entrant runs are not counted.
    pub fn run_count(&self) -> usize {
        self.0.state.lock().run_count
    }

    /// Number of dependencies recorded by the current or last run.
    pub fn dependency_count(&self) -> usize {
        self.0.state.lock().links.len()
    }

    pub(crate) fn scheduler(&self) -> Option<&Arc<dyn Scheduler>> {
        self.0.scheduler.as_ref()
    }

    pub(crate) fn belongs_to(&self, runtime: &Arc<RuntimeInner>) -> bool {
        std::ptr::eq(self.0.runtime.as_ptr(), Arc::as_ptr(runtime))
    }

    pub(crate) fn debug(&self, operation: &Operation) {
        if let Some(debugger) = &self.0.debugger {
            debugger(operation);
        }
    }

    /// Mark the reaction as running. Returns `false` if it already was.
    fn begin_run(&self) -> Result<bool> {
        let mut state = self.0.state.lock();
        if state.stopped {
            return Err(Error::InvalidState(format!(
                "reaction {} has been unobserved",
                self.0.id.raw()
            )));
        }
        if state.running {
            return Ok(false);
        }
        state.running = true;
        Ok(true)
    }

    pub(crate) fn finish_run(&self) {
        let mut state = self.0.state.lock();
        state.running = false;
        state.run_count += 1;
    }

    /// Mark the reaction stopped. Returns `false` if it already was.
    pub(crate) fn mark_stopped(&self) -> bool {
        !std::mem::replace(&mut self.0.state.lock().stopped, true)
    }

    pub(crate) fn record_link(&self, link: Link) -> bool {
        self.0.state.lock().links.insert(link)
    }

    pub(crate) fn take_links(&self) -> HashSet<Link> {
        std::mem::take(&mut self.0.state.lock().links)
    }
}

impl PartialEq for Reaction {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Reaction {}

impl std::hash::Hash for Reaction {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.lock();
        f.debug_struct("Reaction")
            .field("id", &self.0.id.raw())
            .field("run_count", &state.run_count)
            .field("dependency_count", &state.links.len())
            .field("stopped", &state.stopped)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyKey;
    use crate::raw::RawState;

    #[test]
    fn reaction_ids_are_unique() {
        let a = Reaction::detached(|| Ok(Value::Undefined), ObserveOptions::new());
        let b = Reaction::detached(|| Ok(Value::Undefined), ObserveOptions::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn detached_reaction_cannot_run() {
        let reaction = Reaction::detached(|| Ok(Value::Undefined), ObserveOptions::new());
        assert!(reaction.run().unwrap_err().is_invalid_state());
        assert_eq!(reaction.run_count(), 0);
    }

    #[test]
    fn mark_stopped_reports_first_transition() {
        let reaction = Reaction::detached(|| Ok(Value::Undefined), ObserveOptions::new());
        assert!(reaction.mark_stopped());
        assert!(!reaction.mark_stopped());
        assert!(reaction.is_stopped());
    }

    #[test]
    fn links_are_a_set() {
        let reaction = Reaction::detached(|| Ok(Value::Undefined), ObserveOptions::new());
        let target = RawState::record().id();

        assert!(reaction.record_link((target, DependencyKey::property("x"))));
        assert!(!reaction.record_link((target, DependencyKey::property("x"))));
        assert_eq!(reaction.dependency_count(), 1);

        assert_eq!(reaction.take_links().len(), 1);
        assert_eq!(reaction.dependency_count(), 0);
    }

    #[test]
    fn options_debug_hides_callbacks() {
        let options = ObserveOptions::new().debugger(|_| {});
        assert_eq!(
            format!("{options:?}"),
            "ObserveOptions { scheduler: false, debugger: true }"
        );
    }
}
