//! Tensors the ALS engine can decompose
//!
//! The engine only needs a handful of primitives from the tensor: its
//! extents, its norm, the per-mode MTTKRP and the mode Gram matrix used by
//! the SVD initial guess. [`DenseSource`] provides them for a materialized
//! tensor; [`crate::df::PairSource`] for a tensor given implicitly as the
//! contraction of two tensors.

use crate::error::CpResult;
use crate::options::ContractionMethod;
use cpals_core::{DenseND, Scalar};
use cpals_kernels::{mttkrp_direct, mttkrp_indirect};
use scirs2_core::ndarray_ext::Array2;

/// Primitives the ALS engine draws from the tensor being decomposed
pub trait TensorSource<T: Scalar> {
    /// Extent of every mode
    fn extents(&self) -> &[usize];

    fn order(&self) -> usize {
        self.extents().len()
    }

    /// Number of elements
    fn len(&self) -> usize {
        self.extents().iter().product()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Squared Frobenius norm
    fn squared_norm(&self) -> CpResult<T>;

    /// MTTKRP of the tensor for `mode`.
    ///
    /// `factors` holds one matrix per mode; the one at `mode` only
    /// contributes its column count.
    fn mttkrp(
        &mut self,
        factors: &[Array2<T>],
        mode: usize,
        method: ContractionMethod,
    ) -> CpResult<Array2<T>>;

    /// Drop intermediates kept between MTTKRP calls.
    fn invalidate_cache(&mut self) {}

    /// Mode-n Gram matrix X₍ₙ₎ X₍ₙ₎ᵀ (Iₙ × Iₙ)
    fn mode_gram(&self, mode: usize) -> CpResult<Array2<T>>;

    /// The tensor as a dense array
    fn materialize(&self) -> CpResult<DenseND<T>>;

    /// ‖X − approx‖_F
    fn residual_norm(&self, approx: &DenseND<T>) -> CpResult<T> {
        Ok(self.materialize()?.residual_norm(approx)?)
    }
}

/// A materialized reference tensor, borrowed for the engine lifetime
#[derive(Debug, Clone, Copy)]
pub struct DenseSource<'a, T> {
    tensor: &'a DenseND<T>,
}

impl<'a, T: Scalar> DenseSource<'a, T> {
    pub fn new(tensor: &'a DenseND<T>) -> Self {
        Self { tensor }
    }

    pub fn tensor(&self) -> &'a DenseND<T> {
        self.tensor
    }
}

impl<T: Scalar> TensorSource<T> for DenseSource<'_, T> {
    fn extents(&self) -> &[usize] {
        self.tensor.shape()
    }

    fn squared_norm(&self) -> CpResult<T> {
        Ok(self.tensor.squared_norm())
    }

    fn mttkrp(
        &mut self,
        factors: &[Array2<T>],
        mode: usize,
        method: ContractionMethod,
    ) -> CpResult<Array2<T>> {
        let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
        let view = self.tensor.view();
        let m = match method {
            ContractionMethod::Direct => mttkrp_direct(&view, &views, mode)?,
            ContractionMethod::KhatriRao => mttkrp_indirect(&view, &views, mode)?,
        };
        Ok(m)
    }

    fn mode_gram(&self, mode: usize) -> CpResult<Array2<T>> {
        let unfolded = self.tensor.unfold(mode)?;
        Ok(unfolded.dot(&unfolded.t()))
    }

    fn materialize(&self) -> CpResult<DenseND<T>> {
        Ok(self.tensor.clone())
    }

    fn residual_norm(&self, approx: &DenseND<T>) -> CpResult<T> {
        Ok(self.tensor.residual_norm(approx)?)
    }
}
