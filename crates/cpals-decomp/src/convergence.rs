//! Convergence policies for an ALS run
//!
//! The engine hands the policy the full factor set after every sweep. A
//! policy may also receive the last MTTKRP of the sweep and the norm of the
//! reference tensor, which lets [`FitCheck`] track the fit without ever
//! reconstructing the tensor.

use crate::decomp::CpDecomp;
use cpals_core::Scalar;
use scirs2_core::ndarray_ext::Array2;

/// Decides when an ALS run stops
pub trait ConvergenceTest<T: Scalar> {
    /// Called once per sweep with the updated factors.
    fn is_converged(&mut self, decomp: &CpDecomp<T>) -> bool;

    /// Last MTTKRP computed in the sweep, for `mode`
    fn record_mttkrp(&mut self, _mode: usize, _mttkrp: &Array2<T>) {}

    /// Frobenius norm of the tensor being decomposed
    fn set_reference_norm(&mut self, _norm: T) {}

    /// Fit in [0, 1] when the policy tracks it
    fn fit(&self) -> Option<T> {
        None
    }

    /// Forget any per-run history. Called at the start of each ALS run.
    fn reset(&mut self) {}
}

impl<T: Scalar, C: ConvergenceTest<T> + ?Sized> ConvergenceTest<T> for &mut C {
    fn is_converged(&mut self, decomp: &CpDecomp<T>) -> bool {
        (**self).is_converged(decomp)
    }

    fn record_mttkrp(&mut self, mode: usize, mttkrp: &Array2<T>) {
        (**self).record_mttkrp(mode, mttkrp)
    }

    fn set_reference_norm(&mut self, norm: T) {
        (**self).set_reference_norm(norm)
    }

    fn fit(&self) -> Option<T> {
        (**self).fit()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Converged once the summed Frobenius change of the factors between two
/// sweeps drops below `tol`.
#[derive(Debug, Clone)]
pub struct NormCheck<T> {
    tol: T,
    previous: Option<Vec<Array2<T>>>,
    last_change: Option<T>,
}

impl<T: Scalar> NormCheck<T> {
    pub fn new(tol: T) -> Self {
        Self {
            tol,
            previous: None,
            last_change: None,
        }
    }

    /// Change measured at the last sweep
    pub fn last_change(&self) -> Option<T> {
        self.last_change
    }
}

impl<T: Scalar> ConvergenceTest<T> for NormCheck<T> {
    fn is_converged(&mut self, decomp: &CpDecomp<T>) -> bool {
        let change = match &self.previous {
            Some(prev)
                if prev.len() == decomp.factors.len()
                    && prev
                        .iter()
                        .zip(&decomp.factors)
                        .all(|(p, f)| p.shape() == f.shape()) =>
            {
                let mut total = T::zero();
                for (p, f) in prev.iter().zip(&decomp.factors) {
                    let diff = f - p;
                    total += diff.iter().map(|&x| x * x).sum::<T>().sqrt();
                }
                Some(total)
            }
            _ => None,
        };
        self.previous = Some(decomp.factors.clone());
        self.last_change = change;
        change.is_some_and(|c| c < self.tol)
    }

    fn reset(&mut self) {
        self.previous = None;
        self.last_change = None;
    }
}

/// Converged once the fit changes by less than `tol` on two consecutive
/// sweeps.
///
/// The fit is 1 − ‖X − X̂‖ / ‖X‖, with
/// ‖X − X̂‖² = ‖X‖² + ‖X̂‖² − 2⟨X, X̂⟩ evaluated from the Gram matrices and
/// the last recorded MTTKRP. The engine must supply the reference norm and
/// the MTTKRP; without them the fit is unknown and the test never passes.
#[derive(Debug, Clone)]
pub struct FitCheck<T> {
    tol: T,
    reference_norm: Option<T>,
    last_mttkrp: Option<(usize, Array2<T>)>,
    previous_fit: Option<T>,
    fit: Option<T>,
    hits: usize,
}

impl<T: Scalar> FitCheck<T> {
    pub fn new(tol: T) -> Self {
        Self {
            tol,
            reference_norm: None,
            last_mttkrp: None,
            previous_fit: None,
            fit: None,
            hits: 0,
        }
    }

    fn compute_fit(&self, decomp: &CpDecomp<T>) -> Option<T> {
        let norm = self.reference_norm?;
        let (mode, mttkrp) = self.last_mttkrp.as_ref()?;
        let factor = decomp.factors.get(*mode)?;
        if factor.shape() != mttkrp.shape() || norm <= T::zero() {
            return None;
        }

        let mut inner = T::zero();
        for (r, &weight) in decomp.weights.iter().enumerate() {
            let column: T = mttkrp
                .column(r)
                .iter()
                .zip(factor.column(r).iter())
                .map(|(&m, &a)| m * a)
                .sum();
            inner += weight * column;
        }

        let two = T::one() + T::one();
        let residual_sq = norm * norm + decomp.squared_norm() - two * inner;
        Some(T::one() - residual_sq.abs().sqrt() / norm)
    }
}

impl<T: Scalar> ConvergenceTest<T> for FitCheck<T> {
    fn is_converged(&mut self, decomp: &CpDecomp<T>) -> bool {
        let Some(fit) = self.compute_fit(decomp) else {
            return false;
        };
        self.fit = Some(fit);

        let converged = match self.previous_fit {
            Some(prev) if (fit - prev).abs() < self.tol => {
                self.hits += 1;
                self.hits >= 2
            }
            _ => {
                self.hits = 0;
                false
            }
        };
        log::trace!("fit {} (previous {:?})", fit, self.previous_fit);
        self.previous_fit = Some(fit);
        if converged {
            self.hits = 0;
        }
        converged
    }

    fn record_mttkrp(&mut self, mode: usize, mttkrp: &Array2<T>) {
        self.last_mttkrp = Some((mode, mttkrp.clone()));
    }

    fn set_reference_norm(&mut self, norm: T) {
        self.reference_norm = Some(norm);
    }

    fn fit(&self) -> Option<T> {
        self.fit
    }

    fn reset(&mut self) {
        self.previous_fit = None;
        self.last_mttkrp = None;
        self.hits = 0;
    }
}
