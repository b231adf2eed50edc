//! Dynamic Values
//!
//! Observed state is dynamic: a record field can hold a number today and a
//! nested map tomorrow. [`Value`] is the small value model every container
//! stores and every facade hands back.
//!
//! # Equality
//!
//! `Value` compares with SameValueZero semantics:
//!
//! - containers and observables compare by identity, never by contents
//! - strings compare by contents
//! - numbers compare numerically, except that NaN equals NaN (and +0 equals -0)
//!
//! The same relation decides whether a write changed anything and which
//! elements of a set or keys of a map are the same, so a NaN-to-NaN write is
//! a no-op and a set holds at most one NaN.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::observable::Observable;
use crate::raw::{RawState, TargetId};

/// A dynamically typed value stored in, or read from, observed state.
#[derive(Clone, Default)]
pub enum Value {
    /// An absent value.
    #[default]
    Undefined,
    /// An explicitly empty value.
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    /// A raw, untracked container.
    Object(RawState),
    /// A tracked wrapper around a container.
    Observable(Observable),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RawState> {
        match self {
            Self::Object(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn as_observable(&self) -> Option<&Observable> {
        match self {
            Self::Observable(obs) => Some(obs),
            _ => None,
        }
    }

    /// Whether this value is a container, raw or wrapped.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Observable(_))
    }

    /// Strip a wrapper, returning the raw value it stands for.
    ///
    /// Non-wrapper values are returned as they are.
    pub fn into_raw(self) -> Value {
        match self {
            Self::Observable(obs) => Self::Object(obs.raw().clone()),
            other => other,
        }
    }

    /// The raw container behind this value, looking through wrappers.
    pub(crate) fn raw_container(&self) -> Option<&RawState> {
        match self {
            Self::Object(raw) => Some(raw),
            Self::Observable(obs) => Some(obs.raw()),
            _ => None,
        }
    }
}

fn normalized_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Observable(a), Self::Observable(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Undefined | Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Number(n) => normalized_bits(*n).hash(state),
            Self::String(s) => s.hash(state),
            Self::Object(raw) => raw.hash(state),
            Self::Observable(obs) => obs.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Object(raw) => write!(f, "Object({raw:?})"),
            Self::Observable(obs) => write!(f, "Observable({obs:?})"),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<RawState> for Value {
    fn from(raw: RawState) -> Self {
        Self::Object(raw)
    }
}

impl From<Observable> for Value {
    fn from(obs: Observable) -> Self {
        Self::Observable(obs)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

/// Identity-only projection of a [`Value`], used as a dependency key.
///
/// Containers are reduced to their [`TargetId`] (looking through wrappers),
/// so holding an `ElementKey` never keeps a container alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Undefined,
    Null,
    Bool(bool),
    Number(u64),
    String(Arc<str>),
    Target(TargetId),
}

impl From<&Value> for ElementKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Undefined => Self::Undefined,
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(normalized_bits(*n)),
            Value::String(s) => Self::String(Arc::clone(s)),
            Value::Object(raw) => Self::Target(raw.id()),
            Value::Observable(obs) => Self::Target(obs.raw().id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::from(f64::NAN), Value::from(1.0));
    }

    #[test]
    fn signed_zeros_are_one_element() {
        let mut set = HashSet::new();
        set.insert(Value::from(0.0));
        set.insert(Value::from(-0.0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = RawState::record();
        let b = RawState::record();
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn strings_compare_by_contents() {
        assert_eq!(Value::from("value"), Value::from(String::from("value")));
        assert_ne!(Value::from("1"), Value::from(1));
    }

    #[test]
    fn lengths_convert_to_numbers() {
        assert_eq!(Value::from(3usize), Value::from(3));
        assert_eq!(Value::from(0usize).as_number(), Some(0.0));
    }

    #[test]
    fn element_keys_ignore_nan_payloads() {
        let quiet = f64::NAN;
        let other = f64::from_bits(quiet.to_bits() ^ 1);
        assert!(other.is_nan());
        assert_eq!(
            ElementKey::from(&Value::from(quiet)),
            ElementKey::from(&Value::from(other))
        );
    }
}
