//! Element trait shared by every crate in the workspace

use scirs2_core::ndarray_ext::ScalarOperand;
use scirs2_core::numeric::{Float, FloatConst, FromPrimitive, NumAssign};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Floating-point element type accepted by the decomposition engines.
///
/// This bundles the bounds required by `scirs2-linalg` factorizations with
/// the arithmetic the kernels need, so downstream signatures can say
/// `T: Scalar` instead of repeating the whole list. Implemented for every
/// type satisfying the bounds (in practice `f32` and `f64`).
pub trait Scalar:
    Float
    + FloatConst
    + FromPrimitive
    + NumAssign
    + Sum
    + ScalarOperand
    + Send
    + Sync
    + Debug
    + Display
    + 'static
{
    /// Convert an `f64` literal into `Self`.
    ///
    /// Values that cannot be represented become NaN.
    fn cast(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }

    /// Convert a count into `Self`.
    fn from_count(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::nan)
    }

    /// Lossy conversion for logging and error reporting.
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl<T> Scalar for T where
    T: Float
        + FloatConst
        + FromPrimitive
        + NumAssign
        + Sum
        + ScalarOperand
        + Send
        + Sync
        + Debug
        + Display
        + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_roundtrip() {
        assert_eq!(<f64 as Scalar>::cast(0.5), 0.5);
        assert_eq!(<f32 as Scalar>::cast(0.25), 0.25f32);
        assert_eq!(<f64 as Scalar>::from_count(7), 7.0);
        assert_eq!(Scalar::as_f64(2.0f32), 2.0);
    }
}
