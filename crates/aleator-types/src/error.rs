//! Error type shared by all value-type constructors and accessors.

use thiserror::Error;

/// Errors raised when a value type is built or reshaped with
/// incompatible dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The flat data buffer does not hold the announced number of elements.
    #[error("invalid shape: expected {expected} elements, got {got}")]
    InvalidShape { expected: usize, got: usize },

    /// Two dimensions that must agree do not.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An index points past the end of the container.
    #[error("index {index} out of bounds for size {size}")]
    IndexOutOfBounds { index: usize, size: usize },
}
