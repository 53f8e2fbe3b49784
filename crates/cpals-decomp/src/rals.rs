//! Step-size bookkeeping for regularized ALS
//!
//! Regularized ALS damps each mode update towards the factor of the
//! previous sweep. The damping of mode n shrinks with the relative step
//! s = ‖Aₙ − Aₙ_prev‖ / ‖Aₙ‖, so the regularization fades as the iteration
//! settles.

use cpals_core::Scalar;
use scirs2_core::ndarray_ext::Array2;

/// Snapshot of the previous factors of each mode
#[derive(Debug, Clone)]
pub struct RalsHelper<T> {
    previous: Vec<Array2<T>>,
}

impl<T: Scalar> RalsHelper<T> {
    /// Start from a set of normalized factors.
    pub fn new(previous: Vec<Array2<T>>) -> Self {
        Self { previous }
    }

    /// Factor recorded for `mode`
    pub fn previous(&self, mode: usize) -> Option<&Array2<T>> {
        self.previous.get(mode)
    }

    /// Relative step of `mode` to `updated`; records `updated` as the new
    /// previous factor.
    ///
    /// A mode with no usable snapshot (missing or different shape) counts
    /// as a full step of 1.
    pub fn step(&mut self, mode: usize, updated: &Array2<T>) -> T {
        let denom = updated.iter().map(|&x| x * x).sum::<T>().sqrt();
        let s = match self.previous.get(mode) {
            Some(prev) if prev.shape() == updated.shape() && denom > T::zero() => {
                let change: T = updated
                    .iter()
                    .zip(prev.iter())
                    .map(|(&a, &b)| (a - b) * (a - b))
                    .sum();
                change.sqrt() / denom
            }
            _ => T::one(),
        };
        if let Some(slot) = self.previous.get_mut(mode) {
            *slot = updated.clone();
        }
        s
    }
}

/// Damping update λ ← λ · s / (s + 1)
pub fn decay_damping<T: Scalar>(damping: T, step: T) -> T {
    damping * step / (step + T::one())
}
