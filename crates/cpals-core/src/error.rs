//! Error types for dense arrays and linear-algebra primitives

use thiserror::Error;

/// Errors raised by [`DenseND`](crate::DenseND) and the [`linalg`](crate::linalg) primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A requested shape does not hold the available number of elements
    #[error("shape {shape:?} requires {expected} elements, got {actual}")]
    ElementCount {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// A matrix-only routine was called on a tensor of another order
    #[error("{op} requires a 2D matrix, got a {order}D tensor")]
    NotAMatrix { op: &'static str, order: usize },

    /// Mode index outside the tensor order
    #[error("mode {mode} out of bounds for a tensor of order {order}")]
    InvalidMode { mode: usize, order: usize },

    /// Sub-view bounds that do not fit in the tensor
    #[error("bounds {lower:?}..{upper:?} do not fit in shape {shape:?}")]
    OutOfBounds {
        lower: Vec<usize>,
        upper: Vec<usize>,
        shape: Vec<usize>,
    },

    /// Operands with incompatible shapes
    #[error("{op}: incompatible shapes {left:?} and {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    /// A factorization kernel reported failure
    #[error("{op} failed: {message}")]
    Factorization { op: &'static str, message: String },

    /// Cholesky factorization met a non-positive pivot
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,
}

impl CoreError {
    pub(crate) fn factorization(op: &'static str, err: impl std::fmt::Display) -> Self {
        log::debug!("{} failed: {}", op, err);
        CoreError::Factorization {
            op,
            message: err.to_string(),
        }
    }
}

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_matrix_display() {
        let err = CoreError::NotAMatrix {
            op: "qr",
            order: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("qr"));
        assert!(msg.contains("3D"));
    }

    #[test]
    fn test_factorization_helper() {
        let err = CoreError::factorization("svd", "did not converge");
        assert_eq!(
            err,
            CoreError::Factorization {
                op: "svd",
                message: "did not converge".to_string()
            }
        );
    }
}
