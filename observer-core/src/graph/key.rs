//! Dependency Keys
//!
//! A dependency is a `(target, key)` pair: the raw container being read and
//! the facet of it that was read. Keys are scoped per target, so the same
//! property name on two containers names two unrelated dependencies.

use std::fmt;
use std::sync::Arc;

use crate::raw::TargetId;
use crate::value::{ElementKey, Value};

/// A trackable facet of a raw container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKey {
    /// A named property of a record, or a custom property of any container.
    Property(Arc<str>),

    /// A position in a sequence.
    Index(usize),

    /// A member of a set, or a key of a map.
    Element(ElementKey),

    /// Structural changes: anything that adds or removes keys.
    /// Every iteration form depends on it.
    Iteration,

    /// The number of members, entries or items.
    Size,
}

impl DependencyKey {
    pub fn property(name: &str) -> Self {
        Self::Property(Arc::from(name))
    }

    pub fn element(value: &Value) -> Self {
        Self::Element(ElementKey::from(value))
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => write!(f, ".{name}"),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Element(key) => write!(f, "<{key:?}>"),
            Self::Iteration => f.write_str("<iteration>"),
            Self::Size => f.write_str("<size>"),
        }
    }
}

/// One recorded dependency of a reaction.
pub type Link = (TargetId, DependencyKey);
