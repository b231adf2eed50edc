//! Error types for the observer runtime.

use thiserror::Error;

use crate::raw::ContainerKind;

/// Boxed error produced by user code running inside a reaction.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the observer runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A public operation received an argument of the wrong shape or type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A reaction was used after it was stopped, or after its runtime was dropped.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An error raised by a reaction's own function.
    ///
    /// The runtime never wraps or inspects these; they travel back to whoever
    /// caused the run (the `observe` call, a direct `run`, or the mutation that
    /// triggered a rerun).
    #[error(transparent)]
    Reaction(BoxError),
}

impl Error {
    /// Wrap an arbitrary user error so it can be returned from a reaction.
    pub fn reaction(error: impl Into<BoxError>) -> Self {
        Self::Reaction(error.into())
    }

    pub(crate) fn unsupported(operation: &str, kind: ContainerKind) -> Self {
        Self::InvalidArgument(format!("{operation} is not supported on {kind} containers"))
    }

    /// Whether this is an [`Error::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Whether this is an [`Error::InvalidState`].
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_names_operation_and_kind() {
        let err = Error::unsupported("add", ContainerKind::Record);
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "invalid argument: add is not supported on record containers"
        );
    }

    #[test]
    fn reaction_errors_are_transparent() {
        let err = Error::reaction("boom");
        assert!(!err.is_invalid_argument());
        assert!(!err.is_invalid_state());
        assert_eq!(err.to_string(), "boom");
    }
}
