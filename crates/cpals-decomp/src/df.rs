//! Decomposition-friendly tensors: T = Lᵀ R contracted over a shared mode
//!
//! `left` (C × L₁ × ... × L_p) and `right` (C × R₁ × ... × R_q) share their
//! leading extent C, the connecting mode. Together they stand for the
//! order p + q tensor
//!
//! T[l₁, ..., l_p, r₁, ..., r_q] = Σ_c left[c, l₁, ..., l_p] · right[c, r₁, ..., r_q]
//!
//! whose modes are the non-connecting modes of `left` followed by those of
//! `right`. T is never formed: the MTTKRP for a mode on one side
//!
//! 1. reduces the other side over its non-connecting modes with its factors,
//!    giving K (C × R),
//! 2. contracts K with the connecting mode of the own side, giving W,
//! 3. reduces W over every remaining own mode except the target.
//!
//! W depends only on the other side's factors, so it is kept while the
//! sweep stays on one side and recomputed once the sweep crosses over.

use crate::error::{CpError, CpResult};
use crate::options::ContractionMethod;
use crate::source::TensorSource;
use cpals_core::{DenseND, Scalar};
use cpals_kernels::{contract_leading_mode, mttkrp_direct, nmode_product, reduce_except, KernelError};
use scirs2_core::ndarray_ext::{Array2, ArrayView, ArrayView2, IxDyn};

/// Which reference tensor a mode belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct SideCache<T> {
    side: Side,
    rank: usize,
    contracted: Vec<T>,
}

/// A tensor given as the contraction of two tensors over their mode 0
#[derive(Debug, Clone)]
pub struct PairSource<'a, T> {
    left: &'a DenseND<T>,
    right: &'a DenseND<T>,
    extents: Vec<usize>,
    cache: Option<SideCache<T>>,
    rebuilds: usize,
}

impl<'a, T: Scalar> PairSource<'a, T> {
    /// Pair two tensors sharing the extent of mode 0.
    ///
    /// # Errors
    ///
    /// - [`CpError::InvalidOrder`] if either tensor has no modes, or the
    ///   pair has no non-connecting mode at all
    /// - [`CpError::ConnectingExtentMismatch`] if the mode-0 extents differ
    pub fn new(left: &'a DenseND<T>, right: &'a DenseND<T>) -> CpResult<Self> {
        if left.order() == 0 || right.order() == 0 {
            return Err(CpError::InvalidOrder(
                "both tensors need a connecting mode".to_string(),
            ));
        }
        let (lc, rc) = (left.shape()[0], right.shape()[0]);
        if lc != rc {
            return Err(CpError::ConnectingExtentMismatch {
                left: lc,
                right: rc,
            });
        }
        let extents: Vec<usize> = left.shape()[1..]
            .iter()
            .chain(&right.shape()[1..])
            .copied()
            .collect();
        if extents.is_empty() {
            return Err(CpError::InvalidOrder(
                "the contracted pair is a scalar".to_string(),
            ));
        }
        Ok(Self {
            left,
            right,
            extents,
            cache: None,
            rebuilds: 0,
        })
    }

    /// Number of modes contributed by `left`
    pub fn left_modes(&self) -> usize {
        self.left.order() - 1
    }

    /// Side of the implicit `mode` and its index among that side's
    /// non-connecting modes
    pub fn side_of(&self, mode: usize) -> CpResult<(Side, usize)> {
        if mode >= self.extents.len() {
            return Err(KernelError::invalid_mode(mode, self.extents.len(), "PairSource").into());
        }
        let lm = self.left_modes();
        Ok(if mode < lm {
            (Side::Left, mode)
        } else {
            (Side::Right, mode - lm)
        })
    }

    /// How many times the per-side contraction has been computed
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Side whose contraction is currently cached
    pub fn cached_side(&self) -> Option<Side> {
        self.cache.as_ref().map(|c| c.side)
    }

    fn tensors(&self, side: Side) -> (&'a DenseND<T>, &'a DenseND<T>) {
        match side {
            Side::Left => (self.left, self.right),
            Side::Right => (self.right, self.left),
        }
    }

    fn connecting(&self) -> usize {
        self.left.shape()[0]
    }

    /// Step 1: K[c, r] = Σ over the non-connecting modes of `other`,
    /// weighted by its factors.
    fn reduce_other(other: &DenseND<T>, factors: &[Array2<T>], rank: usize) -> CpResult<Array2<T>> {
        let placeholder = Array2::<T>::zeros((other.shape()[0], rank));
        let mut views: Vec<ArrayView2<'_, T>> = Vec::with_capacity(factors.len() + 1);
        views.push(placeholder.view());
        views.extend(factors.iter().map(|f| f.view()));
        Ok(mttkrp_direct(&other.view(), &views, 0)?)
    }

    /// C × C Gram matrix of a side over its non-connecting modes
    fn connecting_gram(tensor: &DenseND<T>) -> CpResult<Array2<T>> {
        let c = tensor.shape()[0];
        let data = tensor.view();
        let standard = data.as_standard_layout();
        let m = as_matrix(&standard.view(), c, tensor.len() / c.max(1))?;
        Ok(m.dot(&m.t()))
    }
}

impl<T: Scalar> TensorSource<T> for PairSource<'_, T> {
    fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// ‖T‖² = Σ (L Lᵀ) ∘ (R Rᵀ) over the connecting mode
    fn squared_norm(&self) -> CpResult<T> {
        if self.connecting() == 0 {
            return Ok(T::zero());
        }
        let gl = Self::connecting_gram(self.left)?;
        let gr = Self::connecting_gram(self.right)?;
        Ok((&gl * &gr).sum())
    }

    /// Always contracts directly; `method` has no Khatri-Rao counterpart
    /// for an implicit tensor.
    fn mttkrp(
        &mut self,
        factors: &[Array2<T>],
        mode: usize,
        _method: ContractionMethod,
    ) -> CpResult<Array2<T>> {
        let (side, local) = self.side_of(mode)?;
        if factors.len() != self.extents.len() {
            return Err(KernelError::dimension_mismatch(
                "PairSource::mttkrp",
                vec![self.extents.len()],
                vec![factors.len()],
                "one factor matrix per mode",
            )
            .into());
        }
        let rank = factors[mode].ncols();
        let lm = self.left_modes();
        let (own_factors, other_factors) = match side {
            Side::Left => (&factors[..lm], &factors[lm..]),
            Side::Right => (&factors[lm..], &factors[..lm]),
        };
        let (own, other) = self.tensors(side);

        let stale = !matches!(&self.cache, Some(c) if c.side == side && c.rank == rank);
        if stale {
            let k = Self::reduce_other(other, other_factors, rank)?;
            let contracted = contract_leading_mode(&own.view(), &k.view())?;
            log::trace!("pair contraction rebuilt for {:?} side", side);
            self.rebuilds += 1;
            self.cache = Some(SideCache {
                side,
                rank,
                contracted,
            });
        }

        let cache = match &self.cache {
            Some(cache) => cache,
            None => {
                return Err(KernelError::operation_error(
                    "PairSource::mttkrp",
                    "side contraction missing",
                )
                .into())
            }
        };
        let views: Vec<_> = own_factors.iter().map(|f| f.view()).collect();
        Ok(reduce_except(
            &cache.contracted,
            &own.shape()[1..],
            rank,
            &views,
            local,
        )?)
    }

    fn invalidate_cache(&mut self) {
        self.cache = None;
    }

    fn mode_gram(&self, mode: usize) -> CpResult<Array2<T>> {
        let (side, local) = self.side_of(mode)?;
        let (own, other) = self.tensors(side);
        if self.connecting() == 0 {
            let n = self.extents[mode];
            return Ok(Array2::zeros((n, n)));
        }
        // weight the connecting mode of the own side by the other side's Gram
        let g_other = Self::connecting_gram(other)?;
        let weighted = DenseND::from_array(nmode_product(&own.view(), &g_other.view(), 0)?);
        let a = own.unfold(local + 1)?;
        let b = weighted.unfold(local + 1)?;
        Ok(a.dot(&b.t()))
    }

    fn materialize(&self) -> CpResult<DenseND<T>> {
        let c = self.connecting();
        let pl: usize = self.left.shape()[1..].iter().product();
        let pr: usize = self.right.shape()[1..].iter().product();
        let product = if c == 0 {
            Array2::zeros((pl, pr))
        } else {
            let (left, right) = (self.left.view(), self.right.view());
            let (left, right) = (left.as_standard_layout(), right.as_standard_layout());
            let l = as_matrix(&left.view(), c, pl)?;
            let r = as_matrix(&right.view(), c, pr)?;
            l.t().dot(&r)
        };
        let full = product
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order(IxDyn(&self.extents))
            .map_err(|e| KernelError::operation_error("PairSource::materialize", e.to_string()))?;
        Ok(DenseND::from_array(full))
    }
}

/// Row-major `rows × cols` view of a standard-layout buffer
fn as_matrix<'v, T: Scalar>(
    data: &ArrayView<'v, T, IxDyn>,
    rows: usize,
    cols: usize,
) -> CpResult<ArrayView2<'v, T>> {
    Ok(data
        .clone()
        .into_shape_with_order((rows, cols))
        .map_err(|e| KernelError::operation_error("PairSource", e.to_string()))?)
}
