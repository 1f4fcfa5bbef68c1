//! Error types for row-pipeline evaluation.

use riffle_core::CoreError;
use thiserror::Error;

/// Errors that can occur while evaluating a row pipeline.
///
/// Protocol misuse (pulling a relation again after it reported exhaustion or
/// failed) is a caller bug and panics rather than appearing here.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A name resolves to two or more accessors under the active case mode.
    #[error("ambiguous binding: {name}")]
    AmbiguousBinding {
        /// The name that was looked up.
        name: String,
    },

    /// A name resolves to nothing in strict typing mode.
    #[error("no such binding: {name}")]
    UnboundVariable {
        /// The name that was looked up.
        name: String,
    },

    /// A navigation function received a negative or non-integer offset.
    #[error("{function} offset must be a non-negative integer, got {found}")]
    InvalidNavigationOffset {
        /// The navigation function name.
        function: String,
        /// The offending offset, rendered for diagnostics.
        found: String,
    },

    /// A window function was constructed with the wrong number of arguments.
    #[error("{function} takes {expected} arguments, got {actual}")]
    InvalidArgCount {
        /// The window function name.
        function: String,
        /// Human-readable description of the accepted arity.
        expected: String,
        /// The number of arguments supplied.
        actual: usize,
    },

    /// A recognized window function that is not implemented yet.
    #[error("window function not implemented: {name}")]
    UnimplementedWindowFunction {
        /// The requested function name.
        name: String,
    },

    /// A window function name that is not recognized at all.
    #[error("unknown window function: {name}")]
    UnknownWindowFunction {
        /// The requested function name.
        name: String,
    },

    /// No dispatch candidate accepts the runtime argument types.
    #[error("no matching overload for {name}{arguments}")]
    NoMatchingOverload {
        /// The function name.
        name: String,
        /// The attempted argument types, rendered as `(A, B, ...)`.
        arguments: String,
    },

    /// A window partition grew past the configured buffering limit.
    #[error("window partition exceeds {limit} buffered rows")]
    PartitionLimitExceeded {
        /// The configured row limit.
        limit: usize,
    },

    /// Evaluation was cancelled cooperatively.
    #[error("evaluation interrupted")]
    Interrupted,

    /// A value-level type error from the core crate.
    #[error(transparent)]
    Type(#[from] CoreError),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;
