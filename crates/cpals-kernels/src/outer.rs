//! Reconstruction of a tensor from CP factors
//!
//! For factors A₀ (I₀ × R), ..., A_N₋₁ (I_N₋₁ × R) and weights λ:
//!
//! `X[i₀, ..., i_N₋₁] = Σᵣ λᵣ A₀[i₀, r] ⋯ A_N₋₁[i_N₋₁, r]`
//!
//! computed as (A₀ · diag λ) · (A₁ ⊙ ... ⊙ A_N₋₁)ᵀ and reshaped.

use crate::error::{KernelError, KernelResult};
use crate::khatri_rao::khatri_rao_except;
use cpals_core::Scalar;
use scirs2_core::ndarray_ext::{Array, ArrayView1, ArrayView2, Axis, IxDyn};

/// Rebuild the full tensor from CP factors and weights
///
/// # Complexity
///
/// Time: O(Π Iᵢ × R)
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use cpals_kernels::cp_reconstruct;
///
/// let a1 = array![[2.0], [3.0]];
/// let a2 = array![[4.0], [5.0], [6.0]];
/// let w = array![0.5];
///
/// let tensor = cp_reconstruct(&[a1.view(), a2.view()], &w.view()).unwrap();
/// assert_eq!(tensor.shape(), &[2, 3]);
/// assert_eq!(tensor[[1, 2]], 9.0); // 0.5 * 3 * 6
/// ```
pub fn cp_reconstruct<T: Scalar>(
    factors: &[ArrayView2<T>],
    weights: &ArrayView1<T>,
) -> KernelResult<Array<T, IxDyn>> {
    if factors.is_empty() {
        return Err(KernelError::empty_input("cp_reconstruct", "factors"));
    }
    let rank = factors[0].ncols();
    if weights.len() != rank {
        return Err(KernelError::dimension_mismatch(
            "cp_reconstruct",
            vec![rank],
            vec![weights.len()],
            "weights length must match rank",
        ));
    }

    let shape: Vec<usize> = factors.iter().map(|f| f.nrows()).collect();
    let krp = khatri_rao_except(factors, 0)?;
    let scaled = &factors[0] * &weights.view().insert_axis(Axis(0));
    // the product may come back column-major, e.g. for single-column factors
    let flat = scaled.dot(&krp.t()).as_standard_layout().into_owned();

    flat.into_shape_with_order(IxDyn(&shape))
        .map_err(|e| KernelError::operation_error("cp_reconstruct", e.to_string()))
}
