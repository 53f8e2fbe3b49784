//! MTTKRP (Matricized Tensor Times Khatri-Rao Product)
//!
//! The per-mode update of CP-ALS needs, for tensor X and factors
//! {A₀, ..., Aₙ₋₁}:
//!
//! M = X_(n) × (A₀ ⊙ ... ⊙ Aₙ₋₁ ⊙ Aₙ₊₁ ⊙ ... ⊙ A_N₋₁)
//!
//! Two interchangeable strategies are provided:
//!
//! - [`mttkrp_indirect`] materializes the Khatri-Rao matrix and does one
//!   matrix product. Simple, but the intermediate holds Π_{i≠n} Iᵢ × R
//!   values.
//! - [`mttkrp_direct`] never forms it: one matrix product contracts the
//!   last mode (or, when the target is the last mode, a transposed product
//!   contracts mode 0), then the remaining modes are folded away one at a
//!   time by Hadamard reductions that carry the target mode along. The
//!   largest intermediate is Π_{i<N-1} Iᵢ × R.
//!
//! Both produce the same matrix up to rounding.

use crate::error::{KernelError, KernelResult};
use crate::khatri_rao::khatri_rao_except;
use cpals_core::Scalar;
use scirs2_core::ndarray_ext::{Array2, ArrayView, ArrayView2, IxDyn};
use std::borrow::Cow;

/// MTTKRP through the explicit Khatri-Rao product
///
/// # Complexity
///
/// Time: O(Π Iᵢ × R)
/// Space: O(R × Π_{i≠n} Iᵢ) for the Khatri-Rao product
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::{Array, Array2};
/// use cpals_kernels::mttkrp_indirect;
///
/// let tensor = Array::from_shape_vec(vec![2, 3, 4], (0..24).map(|x| x as f64).collect()).unwrap();
/// let u1 = Array2::<f64>::ones((2, 2));
/// let u2 = Array2::<f64>::ones((3, 2));
/// let u3 = Array2::<f64>::ones((4, 2));
///
/// let m = mttkrp_indirect(&tensor.view(), &[u1.view(), u2.view(), u3.view()], 1).unwrap();
/// assert_eq!(m.shape(), &[3, 2]);
/// ```
pub fn mttkrp_indirect<T: Scalar>(
    tensor: &ArrayView<T, IxDyn>,
    factors: &[ArrayView2<T>],
    mode: usize,
) -> KernelResult<Array2<T>> {
    validate_factors("mttkrp_indirect", tensor.shape(), factors, mode)?;
    let unfolded = unfold_view(tensor, mode)?;
    let krp = khatri_rao_except(factors, mode)?;
    Ok(unfolded.dot(&krp))
}

/// MTTKRP by sequential contraction, without the Khatri-Rao matrix
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::{Array, Array2};
/// use cpals_kernels::{mttkrp_direct, mttkrp_indirect};
///
/// let tensor = Array::from_shape_vec(vec![2, 3, 4], (0..24).map(|x| x as f64).collect()).unwrap();
/// let u1 = Array2::from_shape_fn((2, 2), |(i, j)| (i + j) as f64);
/// let u2 = Array2::from_shape_fn((3, 2), |(i, j)| (i * j + 1) as f64);
/// let u3 = Array2::from_shape_fn((4, 2), |(i, j)| (i + 2 * j) as f64);
/// let factors = [u1.view(), u2.view(), u3.view()];
///
/// for mode in 0..3 {
///     let d = mttkrp_direct(&tensor.view(), &factors, mode).unwrap();
///     let k = mttkrp_indirect(&tensor.view(), &factors, mode).unwrap();
///     assert_eq!(d, k);
/// }
/// ```
pub fn mttkrp_direct<T: Scalar>(
    tensor: &ArrayView<T, IxDyn>,
    factors: &[ArrayView2<T>],
    mode: usize,
) -> KernelResult<Array2<T>> {
    let shape = tensor.shape().to_vec();
    let rank = validate_factors("mttkrp_direct", &shape, factors, mode)?;
    let order = shape.len();

    if tensor.is_empty() {
        return Ok(Array2::zeros((shape[mode], rank)));
    }

    if order == 1 {
        // empty product over the other modes
        let mut out = Array2::zeros((shape[0], rank));
        for (mut row, &x) in out.outer_iter_mut().zip(tensor.iter()) {
            row.fill(x);
        }
        return Ok(out);
    }

    let last = order - 1;
    if mode != last {
        let data = tensor.as_standard_layout();
        let flat = contiguous(&data, "mttkrp_direct")?;
        let rows = flat.len() / shape[last];
        let mat = ArrayView2::from_shape((rows, shape[last]), flat)
            .map_err(|e| KernelError::operation_error("mttkrp_direct", e.to_string()))?;
        let partial = mat.dot(&factors[last]);
        let buf: Vec<T> = partial.iter().copied().collect();
        reduce_except(&buf, &shape[..last], rank, &factors[..last], mode)
    } else {
        let buf = contract_leading_mode(tensor, &factors[0])?;
        reduce_except(&buf, &shape[1..], rank, &factors[1..], mode - 1)
    }
}

/// Contract mode 0 of `tensor` against the columns of `k`.
///
/// For `tensor` of shape [C, d₁, ..., dₘ] and `k` of shape (C × R) the
/// result is W[d₁, ..., dₘ, r] = Σ_c tensor[c, d₁, ..., dₘ] k[c, r],
/// returned as a row-major buffer with the rank index fastest.
pub fn contract_leading_mode<T: Scalar>(
    tensor: &ArrayView<T, IxDyn>,
    k: &ArrayView2<T>,
) -> KernelResult<Vec<T>> {
    let shape = tensor.shape();
    if shape.is_empty() {
        return Err(KernelError::empty_input("contract_leading_mode", "tensor"));
    }
    if k.nrows() != shape[0] {
        return Err(KernelError::dimension_mismatch(
            "contract_leading_mode",
            vec![shape[0], k.ncols()],
            k.shape().to_vec(),
            "rows of the contraction matrix must match the leading extent",
        ));
    }
    let rest: usize = shape[1..].iter().product();
    if tensor.is_empty() {
        return Ok(vec![T::zero(); rest * k.ncols()]);
    }
    let data = tensor.as_standard_layout();
    let flat = contiguous(&data, "contract_leading_mode")?;
    let mat = ArrayView2::from_shape((shape[0], rest), flat)
        .map_err(|e| KernelError::operation_error("contract_leading_mode", e.to_string()))?;
    let partial = mat.t().dot(k);
    Ok(partial.iter().copied().collect())
}

/// Fold away every mode of a partially contracted buffer except `keep`.
///
/// `buf` is a row-major [dims[0], ..., dims[m-1], rank] array. Modes are
/// reduced from the last one backwards; each reduction multiplies by the
/// matching factor row and sums over that mode. The kept mode rides along
/// as an extra inner extent once the reduction has passed it.
pub fn reduce_except<T: Scalar>(
    buf: &[T],
    dims: &[usize],
    rank: usize,
    factors: &[ArrayView2<T>],
    keep: usize,
) -> KernelResult<Array2<T>> {
    if keep >= dims.len() {
        return Err(KernelError::invalid_mode(keep, dims.len(), "reduce_except"));
    }
    if factors.len() != dims.len() {
        return Err(KernelError::dimension_mismatch(
            "reduce_except",
            vec![dims.len()],
            vec![factors.len()],
            "one factor per buffer mode",
        ));
    }
    let expected: usize = dims.iter().product::<usize>() * rank;
    if buf.len() != expected {
        return Err(KernelError::dimension_mismatch(
            "reduce_except",
            vec![expected],
            vec![buf.len()],
            "buffer length must equal the product of dims times rank",
        ));
    }
    for (idx, (factor, &dim)) in factors.iter().zip(dims).enumerate() {
        if idx == keep {
            continue;
        }
        if factor.nrows() != dim {
            return Err(KernelError::dimension_mismatch(
                "reduce_except",
                vec![dim, rank],
                factor.shape().to_vec(),
                format!("factor {} rows", idx),
            ));
        }
        if factor.ncols() != rank {
            return Err(KernelError::rank_mismatch(
                "reduce_except",
                rank,
                factor.ncols(),
                idx,
            ));
        }
    }

    let mut current: Cow<'_, [T]> = Cow::Borrowed(buf);
    for k in (0..dims.len()).rev() {
        if k == keep {
            continue;
        }
        let left: usize = dims[..k].iter().product();
        let offset = if keep > k { dims[keep] } else { 1 };
        let next = hadamard_contract(&current, left, dims[k], offset, rank, &factors[k]);
        current = Cow::Owned(next);
    }

    Array2::from_shape_vec((dims[keep], rank), current.into_owned())
        .map_err(|e| KernelError::operation_error("reduce_except", e.to_string()))
}

/// One Hadamard reduction step.
///
/// Treats `buf` as [left, mid, offset, rank] and returns
/// out[l, o, r] = Σ_m buf[l, m, o, r] · factor[m, r] as [left, offset, rank].
pub fn hadamard_contract<T: Scalar>(
    buf: &[T],
    left: usize,
    mid: usize,
    offset: usize,
    rank: usize,
    factor: &ArrayView2<T>,
) -> Vec<T> {
    let mut out = vec![T::zero(); left * offset * rank];
    for l in 0..left {
        for m in 0..mid {
            let a_row = factor.row(m);
            for o in 0..offset {
                let src = ((l * mid + m) * offset + o) * rank;
                let dst = (l * offset + o) * rank;
                for ((y, &x), &a) in out[dst..dst + rank]
                    .iter_mut()
                    .zip(&buf[src..src + rank])
                    .zip(a_row.iter())
                {
                    *y += x * a;
                }
            }
        }
    }
    out
}

/// Check the factor list against the tensor extents and return the rank.
///
/// The factor of the target mode only contributes its column count.
fn validate_factors<T>(
    operation: &'static str,
    shape: &[usize],
    factors: &[ArrayView2<T>],
    mode: usize,
) -> KernelResult<usize> {
    if shape.is_empty() {
        return Err(KernelError::empty_input(operation, "tensor"));
    }
    if mode >= shape.len() {
        return Err(KernelError::invalid_mode(
            mode,
            shape.len(),
            format!("{} on a tensor of order {}", operation, shape.len()),
        ));
    }
    if factors.len() != shape.len() {
        return Err(KernelError::dimension_mismatch(
            operation,
            vec![shape.len()],
            vec![factors.len()],
            "one factor matrix per mode",
        ));
    }
    let rank = factors[mode].ncols();
    for (idx, factor) in factors.iter().enumerate() {
        if idx != mode && factor.nrows() != shape[idx] {
            return Err(KernelError::dimension_mismatch(
                operation,
                shape.to_vec(),
                factors.iter().map(|f| f.nrows()).collect(),
                format!("factor {} rows must match the tensor extent", idx),
            ));
        }
        if factor.ncols() != rank {
            return Err(KernelError::rank_mismatch(
                operation,
                rank,
                factor.ncols(),
                idx,
            ));
        }
    }
    Ok(rank)
}

fn contiguous<'a, T>(
    data: &'a scirs2_core::ndarray::CowArray<'_, T, IxDyn>,
    operation: &'static str,
) -> KernelResult<&'a [T]> {
    data.as_slice()
        .ok_or_else(|| KernelError::operation_error(operation, "tensor is not contiguous"))
}

/// Mode-n unfolding of a tensor view (rows: mode n, columns: the other
/// modes in row-major order)
pub(crate) fn unfold_view<T: Scalar>(
    tensor: &ArrayView<T, IxDyn>,
    mode: usize,
) -> KernelResult<Array2<T>> {
    let shape = tensor.shape();
    let mode_size = shape[mode];
    let other_size: usize = shape
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != mode)
        .map(|(_, &s)| s)
        .product();

    let mut perm: Vec<usize> = Vec::with_capacity(shape.len());
    perm.push(mode);
    perm.extend((0..shape.len()).filter(|&i| i != mode));

    let permuted = tensor.view().permuted_axes(IxDyn(&perm));
    let contiguous = permuted.as_standard_layout().into_owned();
    contiguous
        .into_shape_with_order((mode_size, other_size))
        .map_err(|e| KernelError::operation_error("unfold", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::{array, Array, Array2};

    fn iota(shape: &[usize]) -> Array<f64, IxDyn> {
        let n: usize = shape.iter().product();
        Array::from_shape_vec(IxDyn(shape), (0..n).map(|x| x as f64 * 0.5 - 3.0).collect())
            .unwrap()
    }

    fn factor(rows: usize, rank: usize, salt: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, rank), |(i, j)| {
            (((i + 1) * (j + 2) + salt) % 7) as f64 * 0.25 - 0.5
        })
    }

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_direct_matches_indirect_order_four() {
        let shape = [3, 2, 4, 3];
        let tensor = iota(&shape);
        let factors: Vec<Array2<f64>> = shape
            .iter()
            .enumerate()
            .map(|(k, &s)| factor(s, 3, k))
            .collect();
        let views: Vec<_> = factors.iter().map(|f| f.view()).collect();

        for mode in 0..shape.len() {
            let d = mttkrp_direct(&tensor.view(), &views, mode).unwrap();
            let k = mttkrp_indirect(&tensor.view(), &views, mode).unwrap();
            assert_close(&d, &k);
        }
    }

    #[test]
    fn test_order_two_is_matrix_product() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
        let a = array![[1.0, 0.0], [0.0, 1.0]];
        let b = array![[1.0, 2.0], [0.0, 1.0], [1.0, 0.0]];
        let views = [a.view(), b.view()];

        let m0 = mttkrp_direct(&x.view(), &views, 0).unwrap();
        assert_eq!(m0, array![[4.0, 4.0], [10.0, 13.0]]);

        let m1 = mttkrp_direct(&x.view(), &views, 1).unwrap();
        // Xᵀ A
        assert_eq!(m1, array![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);
    }

    #[test]
    fn test_order_one_broadcasts() {
        let x = array![2.0, -1.0, 0.5].into_dyn();
        let a = Array2::<f64>::zeros((3, 2));
        let m = mttkrp_direct(&x.view(), &[a.view()], 0).unwrap();
        assert_eq!(m, array![[2.0, 2.0], [-1.0, -1.0], [0.5, 0.5]]);
        let k = mttkrp_indirect(&x.view(), &[a.view()], 0).unwrap();
        assert_eq!(m, k);
    }

    #[test]
    fn test_non_contiguous_input() {
        let base = iota(&[4, 3, 2]);
        let permuted = base.view().permuted_axes(IxDyn(&[2, 0, 1]));
        let owned = permuted.as_standard_layout().into_owned();
        let factors = [factor(2, 2, 0), factor(4, 2, 1), factor(3, 2, 2)];
        let views: Vec<_> = factors.iter().map(|f| f.view()).collect();

        for mode in 0..3 {
            let a = mttkrp_direct(&permuted, &views, mode).unwrap();
            let b = mttkrp_direct(&owned.view(), &views, mode).unwrap();
            assert_close(&a, &b);
        }
    }

    #[test]
    fn test_empty_tensor_gives_zeros() {
        let x = Array::<f64, IxDyn>::zeros(IxDyn(&[3, 0, 2]));
        let factors = [factor(3, 2, 0), Array2::zeros((0, 2)), factor(2, 2, 1)];
        let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
        let m = mttkrp_direct(&x.view(), &views, 0).unwrap();
        assert_eq!(m, Array2::<f64>::zeros((3, 2)));
    }

    #[test]
    fn test_validation_errors() {
        let x = iota(&[2, 3]);
        let a = factor(2, 2, 0);
        let wrong_rows = factor(4, 2, 0);
        let wrong_rank = factor(3, 1, 0);

        assert!(matches!(
            mttkrp_direct(&x.view(), &[a.view()], 0),
            Err(KernelError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            mttkrp_direct(&x.view(), &[a.view(), wrong_rows.view()], 0),
            Err(KernelError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            mttkrp_direct(&x.view(), &[a.view(), wrong_rank.view()], 0),
            Err(KernelError::RankMismatch { .. })
        ));
        assert!(matches!(
            mttkrp_direct(&x.view(), &[a.view(), a.view()], 2),
            Err(KernelError::InvalidMode { .. })
        ));
    }

    #[test]
    fn test_contract_leading_mode_shape() {
        let x = iota(&[3, 2, 2]);
        let k = factor(3, 4, 0);
        let w = contract_leading_mode(&x.view(), &k.view()).unwrap();
        assert_eq!(w.len(), 2 * 2 * 4);

        let bad = factor(2, 4, 0);
        assert!(contract_leading_mode(&x.view(), &bad.view()).is_err());
    }
}
