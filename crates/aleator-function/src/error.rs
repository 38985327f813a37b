//! Error taxonomy for the function layer.
//!
//! Dimension and argument errors are raised at the point of detection
//! and never recovered internally. The single local-recovery path is
//! the derivative fallback in [`crate::function::Function`], which
//! retries once through centered finite differences before escalating
//! to `InternalError`.

use aleator_types::ShapeError;
use thiserror::Error;

/// Errors raised by evaluations, gradients, hessians and their
/// aggregates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    /// An input, output or parameter vector length disagrees with a
    /// declared dimension. Detected synchronously, before any
    /// computation proceeds.
    #[error("dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        got: usize,
    },

    /// Malformed indices, duplicate indices, out-of-range marginal
    /// components, or incompatible composition dimensions at
    /// construction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A zero-size reference sample was supplied where data is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Both the primary and the finite-difference fallback computation
    /// failed, or an internal invariant was broken.
    #[error("internal error: {0}")]
    InternalError(String),

    /// The capability variant does not support the requested operation.
    #[error("not implemented: {operation}")]
    NotImplemented { operation: String },

    /// An external formula engine reported a failure.
    #[error("formula engine: {0}")]
    FormulaEngine(String),
}

impl FunctionError {
    /// Shorthand for a dimension mismatch with a named context.
    pub(crate) fn dimension(context: &str, expected: usize, got: usize) -> Self {
        FunctionError::DimensionMismatch {
            context: context.to_string(),
            expected,
            got,
        }
    }
}

// Shape errors escaping the value-type layer after the function layer
// has validated its inputs indicate a broken invariant, not a caller
// error.
impl From<ShapeError> for FunctionError {
    fn from(err: ShapeError) -> Self {
        FunctionError::InternalError(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, FunctionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_context() {
        let err = FunctionError::dimension("evaluation input", 3, 2);
        assert_eq!(
            err.to_string(),
            "dimension mismatch in evaluation input: expected 3, got 2"
        );
    }

    #[test]
    fn shape_errors_become_internal() {
        let shape = ShapeError::InvalidShape { expected: 4, got: 2 };
        let err: FunctionError = shape.into();
        assert!(matches!(err, FunctionError::InternalError(_)));
    }
}
