//! Named properties, tracked.

use std::sync::Arc;

use super::Observable;
use crate::error::Result;
use crate::graph::DependencyKey;
use crate::reactive::OperationKind;
use crate::value::Value;

/// Tracked access to the named properties of a container.
///
/// For records, properties are the data. Sequences, sets and maps carry
/// custom properties next to their data, and those are tracked the same way.
pub trait TrackedContainer {
    fn observable(&self) -> &Observable;

    /// Read a property. Missing properties read as `Undefined`; container
    /// values come back wrapped.
    fn get_property(&self, key: &str) -> Value {
        let obs = self.observable();
        obs.track(DependencyKey::property(key), OperationKind::Get);
        obs.wrap_nested(obs.raw().property(key))
    }

    fn has_property(&self, key: &str) -> bool {
        let obs = self.observable();
        obs.track(DependencyKey::property(key), OperationKind::Has);
        obs.raw().has_property(key)
    }

    /// Enumerate property names. Depends on the key set, not on any value.
    fn property_keys(&self) -> Vec<Arc<str>> {
        let obs = self.observable();
        obs.track(DependencyKey::Iteration, OperationKind::Iterate);
        obs.raw().property_keys()
    }

    /// Enumerate properties with their values. Depends on the key set and on
    /// every value read.
    fn property_entries(&self) -> Vec<(Arc<str>, Value)> {
        let obs = self.observable();
        obs.track(DependencyKey::Iteration, OperationKind::Iterate);
        obs.raw()
            .property_keys()
            .into_iter()
            .map(|key| {
                obs.track(DependencyKey::property(&key), OperationKind::Get);
                let value = obs.wrap_nested(obs.raw().property(&key));
                (key, value)
            })
            .collect()
    }

    /// Write a property.
    ///
    /// A new property triggers its readers and everything that enumerated
    /// the keys; an existing one triggers only its readers, and only if the
    /// value changed. Observables are stored as their raw container.
    ///
    /// # Errors
    ///
    /// Errors returned by synchronously rerun reactions.
    fn set_property(&self, key: &str, value: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        let obs = self.observable();
        let value = value.into().into_raw();
        match obs.raw().set_property(key, value.clone()) {
            None => obs.trigger(
                OperationKind::Add,
                &[DependencyKey::property(key), DependencyKey::Iteration],
            ),
            Some(previous) if previous != value => {
                obs.trigger(OperationKind::Set, &[DependencyKey::property(key)])
            }
            Some(_) => Ok(()),
        }
    }

    /// Delete a property. Returns `false` (and triggers nothing) if it did
    /// not exist.
    fn delete_property(&self, key: &str) -> Result<bool> {
        let obs = self.observable();
        if obs.raw().delete_property(key).is_none() {
            return Ok(false);
        }
        obs.trigger(
            OperationKind::Delete,
            &[DependencyKey::property(key), DependencyKey::Iteration],
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawState;
    use crate::reactive::Runtime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn property_reads_are_tracked() {
        let runtime = Runtime::new();
        let obs = runtime.wrap(&RawState::record_from([("count", 0)]));
        let runs = counter();

        let (o, r) = (obs.clone(), runs.clone());
        runtime
            .observe(move || {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(o.get_property("count"))
            })
            .unwrap();

        obs.set_property("count", 1).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        obs.set_property("other", 1).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unchanged_writes_do_not_trigger() {
        let runtime = Runtime::new();
        let obs = runtime.wrap(&RawState::record_from([("n", f64::NAN)]));
        let runs = counter();

        let (o, r) = (obs.clone(), runs.clone());
        runtime
            .observe(move || {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(o.get_property("n"))
            })
            .unwrap();

        obs.set_property("n", f64::NAN).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn new_keys_trigger_enumerators() {
        let runtime = Runtime::new();
        let obs = runtime.wrap(&RawState::record());
        let seen = counter();

        let (o, s) = (obs.clone(), seen.clone());
        runtime
            .observe(move || {
                s.store(o.property_keys().len(), Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        obs.set_property("a", 1).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        obs.set_property("a", 2).unwrap();
        assert!(obs.delete_property("a").unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deleting_missing_property_is_a_no_op() {
        let runtime = Runtime::new();
        let obs = runtime.wrap(&RawState::record());
        let runs = counter();

        let (o, r) = (obs.clone(), runs.clone());
        runtime
            .observe(move || {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(o.has_property("gone"))
            })
            .unwrap();

        assert!(!obs.delete_property("gone").unwrap());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_containers_come_back_wrapped() {
        let runtime = Runtime::new();
        let inner = RawState::record();
        let obs = runtime.wrap(&RawState::record_from([("inner", inner.clone())]));

        let nested = obs.get_property("inner");
        assert!(runtime.is_observable(&nested));
        assert_eq!(nested.as_observable().unwrap().raw(), &inner);
    }

    #[test]
    fn observables_are_stored_raw() {
        let runtime = Runtime::new();
        let raw = RawState::record();
        let obs = runtime.wrap(&raw);
        let child = runtime.wrap(&RawState::record());

        obs.set_property("child", child.clone()).unwrap();
        assert_eq!(raw.property("child"), Value::Object(child.raw().clone()));
    }
}
