//! Active Reaction Stack
//!
//! The stack tracks which reaction is currently running. This enables
//! automatic dependency tracking: when a facade reads state, the read is
//! attributed to the reaction on top of the stack.
//!
//! # Implementation
//!
//! Running a reaction pushes it and returns a [`RunGuard`]; dropping the
//! guard pops it again. Because a reaction's run can write state that
//! synchronously runs *other* reactions, the stack grows and shrinks with
//! nested runs, and reads made by an inner run are attributed to the inner
//! reaction, not the outer one.
//!
//! The stack belongs to a [`Runtime`](super::Runtime). The lock is only held
//! while pushing, popping or peeking, never while a reaction runs.

use parking_lot::Mutex;

use super::reaction::Reaction;

#[derive(Default)]
pub(crate) struct ActiveStack {
    stack: Mutex<Vec<Reaction>>,
}

impl ActiveStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `reaction` for the lifetime of the returned guard.
    pub fn enter(&self, reaction: Reaction) -> RunGuard<'_> {
        self.stack.lock().push(reaction.clone());
        RunGuard {
            stack: self,
            reaction,
        }
    }

    /// The innermost running reaction, if any.
    pub fn current(&self) -> Option<Reaction> {
        self.stack.lock().last().cloned()
    }

    pub fn is_active(&self) -> bool {
        !self.stack.lock().is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.lock().len()
    }
}

/// Pops the stack and ends the reaction's run when dropped.
///
/// This keeps the stack consistent even if the reaction panics.
pub(crate) struct RunGuard<'a> {
    stack: &'a ActiveStack,
    reaction: Reaction,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let popped = self.stack.stack.lock().pop();

        if let Some(popped) = popped {
            debug_assert_eq!(
                popped.id(),
                self.reaction.id(),
                "ActiveStack mismatch: expected {:?}, got {:?}",
                self.reaction.id(),
                popped.id()
            );
        }

        self.reaction.finish_run();
    }
}
