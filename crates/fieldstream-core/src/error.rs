//! Error types for fieldstream.

use crate::lane::Lane;
use thiserror::Error;

/// Boxed error used for failures raised by collaborators (resources,
/// user callbacks) that are not fieldstream errors themselves.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for fieldstream operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument to a field, predicate, comparator or operation
    /// constructor was missing
    #[error("Construction error: {0}")]
    Construction(String),

    /// An operation was attached to a pipeline in a different element lane
    #[error("Lane mismatch: operation expects the {expected} lane but the pipeline is in the {actual} lane")]
    LaneMismatch {
        /// Lane the operation was built for
        expected: Lane,
        /// Lane the pipeline (or element) is actually in
        actual: Lane,
    },

    /// Append after freeze, double termination, execution of an
    /// unterminated pipeline or use of a closed stream
    #[error("Pipeline state error: {0}")]
    PipelineState(String),

    /// Raw cursor access while the escape hatch is disabled
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The backing resource failed to release
    #[error("Resource release failed: {0}")]
    ResourceRelease(#[source] BoxError),

    /// A fallible terminal callback reported a failure
    #[error("Terminal operation failed: {0}")]
    Operation(#[source] BoxError),

    /// A source failed to open its sequence
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A terminal failure followed by a release failure. The terminal
    /// failure is the primary error; the release failure is the source.
    #[error("{primary} (additionally: {secondary})")]
    Chained {
        /// The failure that happened first
        primary: Box<Error>,
        /// The failure raised while cleaning up after `primary`
        #[source]
        secondary: Box<Error>,
    },
}

impl Error {
    /// Wraps a collaborator failure as a terminal operation failure.
    pub fn operation<E: Into<BoxError>>(err: E) -> Self {
        Error::Operation(err.into())
    }

    /// Wraps a collaborator failure as a release failure.
    pub fn release<E: Into<BoxError>>(err: E) -> Self {
        Error::ResourceRelease(err.into())
    }

    /// Chains `secondary` behind `primary`.
    pub fn chain(primary: Error, secondary: Error) -> Self {
        Error::Chained {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }
    }

    /// The error that should be reported first.
    pub fn primary(&self) -> &Error {
        match self {
            Error::Chained { primary, .. } => primary.primary(),
            other => other,
        }
    }

    /// The error chained behind the primary one, if any.
    pub fn secondary(&self) -> Option<&Error> {
        match self {
            Error::Chained { secondary, .. } => Some(secondary),
            _ => None,
        }
    }
}

/// A specialized `Result` type for fieldstream operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_chained_keeps_primary_first() {
        let err = Error::chain(
            Error::operation("boom"),
            Error::release(std::io::Error::new(std::io::ErrorKind::Other, "cursor")),
        );
        assert!(matches!(err.primary(), Error::Operation(_)));
        assert!(matches!(err.secondary(), Some(Error::ResourceRelease(_))));
        assert!(err.source().is_some());
        let text = err.to_string();
        assert!(text.starts_with("Terminal operation failed: boom"));
        assert!(text.contains("cursor"));
    }

    #[test]
    fn test_lane_mismatch_display() {
        let err = Error::LaneMismatch {
            expected: Lane::Int,
            actual: Lane::Double,
        };
        assert_eq!(
            err.to_string(),
            "Lane mismatch: operation expects the int lane but the pipeline is in the double lane"
        );
    }
}
