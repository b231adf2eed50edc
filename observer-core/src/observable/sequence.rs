//! Sequence facade.
//!
//! Index reads depend on the index, `len` on the size, and enumeration on
//! the iteration sentinel plus every index yielded. Structural writes
//! (growth, shrinkage, shifting) trigger each index whose value moved, the
//! iteration sentinel and the size.

use super::{Observable, TrackedContainer};
use crate::error::Result;
use crate::graph::DependencyKey;
use crate::reactive::OperationKind;
use crate::value::Value;

/// Tracked view of a sequence. Obtained from [`Observable::as_sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableSequence(pub(super) Observable);

impl ObservableSequence {
    pub fn into_observable(self) -> Observable {
        self.0
    }

    /// Read the item at `index`. Out-of-range reads are `Undefined`.
    pub fn get(&self, index: usize) -> Value {
        self.0.track(DependencyKey::Index(index), OperationKind::Get);
        self.0.wrap_nested(self.0.raw().item(index).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.0.track(DependencyKey::Size, OperationKind::Iterate);
        self.0.raw().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every item.
    pub fn values(&self) -> Vec<Value> {
        self.0.track(DependencyKey::Iteration, OperationKind::Iterate);
        self.snapshot()
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                self.0.track(DependencyKey::Index(index), OperationKind::Get);
                self.0.wrap_nested(value)
            })
            .collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.values().into_iter()
    }

    /// Visit every `(item, index)` pair.
    pub fn for_each(&self, mut f: impl FnMut(Value, usize)) {
        for (index, value) in self.values().into_iter().enumerate() {
            f(value, index);
        }
    }

    /// Write the item at `index`, growing the sequence with `Undefined` holes
    /// if needed.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into().into_raw();
        let before = self.0.raw().len();
        match self.0.raw().set_item(index, value.clone())? {
            None => {
                let keys = shifted(before.min(index), index + 1);
                self.0.trigger(OperationKind::Add, &keys)
            }
            Some(previous) if previous != value => self
                .0
                .trigger(OperationKind::Set, &[DependencyKey::Index(index)]),
            Some(_) => Ok(()),
        }
    }

    /// Append an item, returning the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        let len = self.0.raw().push(value.into().into_raw())?;
        self.0.trigger(OperationKind::Add, &shifted(len - 1, len))?;
        Ok(len)
    }

    /// Remove and return the last item, or `Undefined` if empty.
    pub fn pop(&self) -> Result<Value> {
        let Some(value) = self.0.raw().pop()? else {
            return Ok(Value::Undefined);
        };
        let len = self.0.raw().len();
        self.0.trigger(OperationKind::Delete, &shifted(len, len + 1))?;
        Ok(self.0.wrap_nested(value))
    }

    /// Insert an item at `index`, shifting later items up. Indices past the
    /// end append.
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let before = self.0.raw().len();
        self.0.raw().insert_item(index, value.into().into_raw())?;
        self.0
            .trigger(OperationKind::Add, &shifted(index.min(before), before + 1))
    }

    /// Remove the item at `index`, shifting later items down. Out-of-range
    /// indices remove nothing and return `Undefined`.
    pub fn remove(&self, index: usize) -> Result<Value> {
        let before = self.0.raw().len();
        let Some(value) = self.0.raw().remove_item(index)? else {
            return Ok(Value::Undefined);
        };
        self.0.trigger(OperationKind::Delete, &shifted(index, before))?;
        Ok(self.0.wrap_nested(value))
    }

    /// Remove every item.
    pub fn clear(&self) -> Result<()> {
        let before = self.0.raw().len();
        self.0.raw().clear()?;
        if before == 0 {
            return Ok(());
        }
        self.0.trigger(
            OperationKind::Clear,
            &super::cleared((0..before).map(DependencyKey::Index)),
        )
    }

    fn snapshot(&self) -> Vec<Value> {
        // Views only exist over sequences.
        self.0.raw().values().unwrap_or_default()
    }
}

/// Keys touched when the items in `from..to` changed position or existence.
fn shifted(from: usize, to: usize) -> Vec<DependencyKey> {
    (from..to)
        .map(DependencyKey::Index)
        .chain([DependencyKey::Iteration, DependencyKey::Size])
        .collect()
}

impl TrackedContainer for ObservableSequence {
    fn observable(&self) -> &Observable {
        &self.0
    }
}

impl IntoIterator for &ObservableSequence {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawState;
    use crate::reactive::Runtime;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sequence(runtime: &Runtime, items: &[i32]) -> ObservableSequence {
        runtime
            .wrap(&RawState::sequence_from(items.iter().copied()))
            .as_sequence()
            .unwrap()
    }

    #[test]
    fn index_reads_ignore_other_indices() {
        let runtime = Runtime::new();
        let seq = sequence(&runtime, &[1, 2, 3]);
        let runs = Arc::new(AtomicUsize::new(0));

        let (s, r) = (seq.clone(), runs.clone());
        runtime
            .observe(move || {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(s.get(0))
            })
            .unwrap();

        seq.set(2, 30).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        seq.set(0, 10).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn push_and_pop_trigger_length_readers() {
        let runtime = Runtime::new();
        let seq = sequence(&runtime, &[]);
        let len = Arc::new(AtomicUsize::new(usize::MAX));

        let (s, l) = (seq.clone(), len.clone());
        runtime
            .observe(move || {
                l.store(s.len(), Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(len.load(Ordering::SeqCst), 0);

        assert_eq!(seq.push("a").unwrap(), 1);
        assert_eq!(seq.push("b").unwrap(), 2);
        assert_eq!(len.load(Ordering::SeqCst), 2);

        assert_eq!(seq.pop().unwrap(), Value::from("b"));
        assert_eq!(len.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn insert_shifts_tracked_indices() {
        let runtime = Runtime::new();
        let seq = sequence(&runtime, &[1, 2]);
        let last = Arc::new(Mutex::new(Value::Undefined));

        let (s, l) = (seq.clone(), last.clone());
        runtime
            .observe(move || {
                *l.lock() = s.get(1);
                Ok(())
            })
            .unwrap();

        seq.insert(0, 0).unwrap();
        assert_eq!(*last.lock(), Value::from(1));

        seq.remove(0).unwrap();
        assert_eq!(*last.lock(), Value::from(2));
    }

    #[test]
    fn enumeration_sees_structural_changes() {
        let runtime = Runtime::new();
        let seq = sequence(&runtime, &[1, 2]);
        let sum = Arc::new(Mutex::new(0.0));

        let (s, total) = (seq.clone(), sum.clone());
        runtime
            .observe(move || {
                *total.lock() = s.iter().filter_map(|v| v.as_number()).sum();
                Ok(())
            })
            .unwrap();
        assert_eq!(*sum.lock(), 3.0);

        seq.set(0, 5).unwrap();
        assert_eq!(*sum.lock(), 7.0);
        seq.push(3).unwrap();
        assert_eq!(*sum.lock(), 10.0);
        seq.clear().unwrap();
        assert_eq!(*sum.lock(), 0.0);
    }

    #[test]
    fn writing_past_the_end_fills_holes() {
        let runtime = Runtime::new();
        let seq = sequence(&runtime, &[]);
        let len = Arc::new(AtomicUsize::new(0));

        let (s, l) = (seq.clone(), len.clone());
        runtime
            .observe(move || {
                l.store(s.len(), Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        seq.set(2, "c").unwrap();
        assert_eq!(len.load(Ordering::SeqCst), 3);
        assert!(seq.get(1).is_undefined());
    }

    #[test]
    fn huge_indices_are_rejected_without_triggering() {
        let runtime = Runtime::new();
        let seq = sequence(&runtime, &[1]);
        let runs = Arc::new(AtomicUsize::new(0));

        let (s, r) = (seq.clone(), runs.clone());
        runtime
            .observe(move || {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(s.len())
            })
            .unwrap();

        assert!(seq.set(usize::MAX, 1).unwrap_err().is_invalid_argument());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn popping_an_empty_sequence_is_a_no_op() {
        let runtime = Runtime::new();
        let seq = sequence(&runtime, &[]);
        assert!(seq.pop().unwrap().is_undefined());
        assert!(seq.remove(4).unwrap().is_undefined());
        seq.clear().unwrap();
    }
}
