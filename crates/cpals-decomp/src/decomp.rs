//! CP factor set: factor matrices plus component weights
//!
//! X ≈ Σᵣ λᵣ (a₀ᵣ ⊗ a₁ᵣ ⊗ ... ⊗ a_N₋₁ᵣ)
//!
//! Factor `Aₙ` has shape (Iₙ × R). Outside of a rank rebuild every factor
//! has the same column count and unit-norm columns, the magnitude living in
//! the weights `λ`.

use crate::error::{CpError, CpResult};
use cpals_core::linalg::{cholesky_solve, pseudo_inverse};
use cpals_core::{DenseND, Scalar};
use cpals_kernels::{cp_reconstruct, gram_hadamard_except, khatri_rao_except};
use scirs2_core::ndarray_ext::{Array1, Array2, ArrayView2, Axis};

/// Which normal-equations solve produced an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStrategy {
    /// Cholesky factorization and two triangular solves
    Cholesky,
    /// SVD pseudoinverse with a singular-value cutoff
    Pseudoinverse,
}

/// CP decomposition result
#[derive(Debug, Clone, PartialEq)]
pub struct CpDecomp<T> {
    /// One (Iₙ × R) matrix per mode
    pub factors: Vec<Array2<T>>,
    /// Weight of each rank-one component
    pub weights: Array1<T>,
}

impl<T: Scalar> CpDecomp<T> {
    /// Build from factors and weights, checking that the ranks agree.
    pub fn new(factors: Vec<Array2<T>>, weights: Array1<T>) -> CpResult<Self> {
        if factors.is_empty() {
            return Err(CpError::InvalidOrder("no factor matrices".to_string()));
        }
        let rank = weights.len();
        for factor in &factors {
            if factor.ncols() != rank {
                return Err(CpError::InvalidRank(factor.ncols()));
            }
        }
        Ok(Self { factors, weights })
    }

    /// Unit weights over the given factors
    pub fn with_unit_weights(factors: Vec<Array2<T>>) -> CpResult<Self> {
        let rank = factors.first().map_or(0, |f| f.ncols());
        Self::new(factors, Array1::ones(rank))
    }

    pub fn rank(&self) -> usize {
        self.weights.len()
    }

    pub fn order(&self) -> usize {
        self.factors.len()
    }

    /// Row count of every factor
    pub fn shape(&self) -> Vec<usize> {
        self.factors.iter().map(|f| f.nrows()).collect()
    }

    pub fn views(&self) -> Vec<ArrayView2<'_, T>> {
        self.factors.iter().map(|f| f.view()).collect()
    }

    /// Rescale every column of `factors[mode]` to unit 2-norm and fold the
    /// removed magnitude into the weights.
    ///
    /// Zero columns are left as they are. The reconstruction does not
    /// change.
    pub fn normalize(&mut self, mode: usize) -> CpResult<()> {
        let factor = self
            .factors
            .get_mut(mode)
            .ok_or_else(|| CpError::InvalidOrder(format!("mode {} out of range", mode)))?;
        for (mut column, weight) in factor.axis_iter_mut(Axis(1)).zip(self.weights.iter_mut()) {
            let norm = column.iter().map(|&x| x * x).sum::<T>().sqrt();
            if norm > T::zero() {
                column.mapv_inplace(|x| x / norm);
                *weight *= norm;
            }
        }
        Ok(())
    }

    /// Replace the weights by the column norms of `factors[mode]`.
    ///
    /// Used right after a mode update, where the solved factor already
    /// carries the whole scale of each component.
    pub(crate) fn extract_weights(&mut self, mode: usize) -> CpResult<()> {
        self.weights.fill(T::one());
        self.normalize(mode)
    }

    /// Full tensor Σᵣ λᵣ a₀ᵣ ⊗ ... ⊗ a_N₋₁ᵣ
    ///
    /// Costs O(Π Iₙ · R); meant for error reports and checks.
    pub fn reconstruct(&self) -> CpResult<DenseND<T>> {
        let views = self.views();
        let full = cp_reconstruct(&views, &self.weights.view())?;
        Ok(DenseND::from_array(full))
    }

    /// Hadamard product of the Gram matrices of every factor but `mode`
    pub fn gram_hadamard_except(&self, mode: usize) -> CpResult<Array2<T>> {
        Ok(gram_hadamard_except(&self.views(), mode)?)
    }

    /// Khatri-Rao product of every factor but `mode`, in forward mode order
    pub fn khatri_rao_except(&self, mode: usize) -> CpResult<Array2<T>> {
        Ok(khatri_rao_except(&self.views(), mode)?)
    }

    /// Squared norm of the reconstruction, λᵀ (∘ₙ AₙᵀAₙ) λ
    pub fn squared_norm(&self) -> T {
        let rank = self.rank();
        let mut g = Array2::<T>::ones((rank, rank));
        for factor in &self.factors {
            g *= &factor.t().dot(factor);
        }
        self.weights.dot(&g.dot(&self.weights))
    }
}

/// Solve `X · gram = rhs` for X.
///
/// With `fast` set a Cholesky solve is tried first; a gram matrix that is
/// not positive definite falls back to the SVD pseudoinverse.
pub fn solve_normal_equations<T: Scalar>(
    gram: &ArrayView2<T>,
    rhs: &ArrayView2<T>,
    fast: bool,
    threshold: T,
) -> CpResult<(Array2<T>, SolveStrategy)> {
    if gram.nrows() != rhs.ncols() {
        return Err(CpError::InvalidRank(rhs.ncols()));
    }
    if fast {
        match cholesky_solve(gram, rhs) {
            Ok(solution) => return Ok((solution, SolveStrategy::Cholesky)),
            Err(err) => log::debug!("cholesky solve failed ({}), using pseudoinverse", err),
        }
    }
    let pinv = pseudo_inverse(gram, threshold)?;
    Ok((rhs.dot(&pinv), SolveStrategy::Pseudoinverse))
}
