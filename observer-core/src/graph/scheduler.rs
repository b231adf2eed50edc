//! Rerun Schedulers
//!
//! By default a triggered reaction reruns synchronously, before the write
//! that triggered it returns. A reaction observed with a [`Scheduler`]
//! instead has its reruns submitted to that scheduler, which decides when
//! (and in what order) to actually run them.
//!
//! The contract is small:
//!
//! - `add` must eventually cause [`Reaction::run`] to be called again
//! - `delete` must cancel any run the scheduler still owes the reaction
//!
//! The runtime guarantees `add` is called at most once per reaction per
//! triggering write, and that `delete` is called when the reaction is
//! unobserved.
//!
//! [`QueueScheduler`] is the stock implementation: it batches reruns in
//! insertion order until [`QueueScheduler::flush`] is called.

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::Result;
use crate::reactive::{Reaction, ReactionId};

/// Controls when triggered reactions rerun.
pub trait Scheduler: Send + Sync {
    /// A dependency of `reaction` changed; it must run again eventually.
    fn add(&self, reaction: &Reaction);

    /// `reaction` was unobserved; drop any pending run.
    fn delete(&self, reaction: &Reaction);
}

/// A scheduler that queues reruns until explicitly flushed.
///
/// A reaction triggered several times before a flush runs once.
#[derive(Default)]
pub struct QueueScheduler {
    queue: Mutex<IndexMap<ReactionId, Reaction>>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reactions waiting to run.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn contains(&self, reaction: &Reaction) -> bool {
        self.queue.lock().contains_key(&reaction.id())
    }

    /// Run queued reactions, oldest first, until the queue is empty.
    ///
    /// Reactions queued while flushing run in the same flush. Returns the
    /// number of runs performed. If a reaction fails, its error is returned
    /// and the reactions behind it stay queued.
    pub fn flush(&self) -> Result<usize> {
        let mut ran = 0;
        loop {
            // The lock must be released before running: reactions may write
            // state that queues more work on this scheduler.
            let next = self.queue.lock().shift_remove_index(0);
            let Some((_, reaction)) = next else {
                break;
            };
            if reaction.is_stopped() {
                continue;
            }
            reaction.run()?;
            ran += 1;
        }
        tracing::trace!(ran, "scheduler.queue.flushed");
        Ok(ran)
    }
}

impl Scheduler for QueueScheduler {
    fn add(&self, reaction: &Reaction) {
        self.queue
            .lock()
            .entry(reaction.id())
            .or_insert_with(|| reaction.clone());
    }

    fn delete(&self, reaction: &Reaction) {
        self.queue.lock().shift_remove(&reaction.id());
    }
}

impl std::fmt::Debug for QueueScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueScheduler")
            .field("pending", &self.len())
            .finish()
    }
}
