//! Decision engine error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// How a call to the decision engine failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EngineErrorKind {
    /// Engine unreachable, timed out, or reported itself unavailable.
    #[display("unavailable")]
    Unavailable,
    /// Engine answered with an error status.
    #[display("rejected")]
    Rejected,
    /// Engine answered with a body that is not a valid result.
    #[display("malformed response")]
    Malformed,
}

/// Decision engine error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Engine error ({}): {} at {}:{}", kind, message, file, line)]
pub struct EngineError {
    /// Failure category.
    pub kind: EngineErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl EngineError {
    /// Creates a new engine error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Engine could not be reached in time.
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Unavailable, message)
    }

    /// Engine refused the request.
    #[track_caller]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Rejected, message)
    }

    /// Engine returned something unusable.
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Malformed, message)
    }
}
