//! Operation events for reaction debuggers.

use std::fmt;
use std::sync::Arc;

use crate::graph::DependencyKey;
use crate::raw::TargetId;

/// What happened to a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A value was read.
    Get,
    /// Presence of a key or member was tested.
    Has,
    /// Keys, values or entries were enumerated, or a size was read.
    Iterate,
    /// A key or member was added.
    Add,
    /// An existing key was overwritten with a different value.
    Set,
    /// A key or member was removed.
    Delete,
    /// A collection was emptied.
    Clear,
}

impl OperationKind {
    /// Whether this operation registers a dependency (as opposed to
    /// triggering one).
    pub fn is_read(self) -> bool {
        matches!(self, Self::Get | Self::Has | Self::Iterate)
    }
}

/// A tracked read or a triggering write, as seen by a reaction's debugger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub target: TargetId,
    /// The key read or written. For writes that touch several keys this is
    /// the most specific one.
    pub key: DependencyKey,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} #{}{}", self.kind, self.target.raw(), self.key)
    }
}

/// Callback receiving every [`Operation`] that concerns one reaction.
pub type Debugger = Arc<dyn Fn(&Operation) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawState;

    #[test]
    fn reads_and_writes_are_distinguished() {
        assert!(OperationKind::Get.is_read());
        assert!(OperationKind::Iterate.is_read());
        assert!(!OperationKind::Add.is_read());
        assert!(!OperationKind::Clear.is_read());
    }

    #[test]
    fn display_names_target_and_key() {
        let target = RawState::record().id();
        let op = Operation {
            kind: OperationKind::Set,
            target,
            key: DependencyKey::property("count"),
        };
        assert_eq!(op.to_string(), format!("Set #{}.count", target.raw()));
    }
}
