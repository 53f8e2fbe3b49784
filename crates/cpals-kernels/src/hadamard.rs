//! Hadamard (element-wise) products and Gram matrices
//!
//! The normal equations of a CP-ALS mode update are `A_n · G = M`, where
//! `G` is the Hadamard product of the Gram matrices `AᵢᵀAᵢ` of every other
//! factor. Forming `G` this way costs O(Σ Iᵢ R²) instead of the
//! O(Π Iᵢ R²) of `KᵀK` with the explicit Khatri-Rao matrix `K`.

use crate::error::{KernelError, KernelResult};
use cpals_core::Scalar;
use scirs2_core::ndarray_ext::{Array2, ArrayView2};

/// Element-wise product of two matrices of the same shape
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use cpals_kernels::hadamard;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];
/// let b = array![[5.0, 6.0], [7.0, 8.0]];
/// let c = hadamard(&a.view(), &b.view()).unwrap();
/// assert_eq!(c[[1, 1]], 32.0);
/// ```
pub fn hadamard<T: Scalar>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>> {
    if a.shape() != b.shape() {
        return Err(KernelError::dimension_mismatch(
            "hadamard",
            a.shape().to_vec(),
            b.shape().to_vec(),
            "Element-wise multiplication requires same shape",
        ));
    }
    Ok(a * b)
}

/// Gram matrix `AᵀA` of a factor (R × R)
pub fn gram<T: Scalar>(a: &ArrayView2<T>) -> Array2<T> {
    a.t().dot(a)
}

/// Hadamard product of the Gram matrices of every factor except `skip`.
///
/// With no other factor this is the all-ones R × R matrix.
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use cpals_kernels::gram_hadamard_except;
///
/// let a = array![[1.0, 0.0], [0.0, 2.0]];
/// let b = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
/// let g = gram_hadamard_except(&[a.view(), b.view()], 0).unwrap();
/// assert_eq!(g, array![[3.0, 3.0], [3.0, 3.0]]);
/// ```
pub fn gram_hadamard_except<T: Scalar>(
    factors: &[ArrayView2<T>],
    skip: usize,
) -> KernelResult<Array2<T>> {
    if skip >= factors.len() {
        return Err(KernelError::invalid_mode(
            skip,
            factors.len(),
            "gram_hadamard_except",
        ));
    }
    let rank = factors[skip].ncols();
    let mut g = Array2::<T>::ones((rank, rank));
    for (idx, factor) in factors.iter().enumerate() {
        if idx == skip {
            continue;
        }
        if factor.ncols() != rank {
            return Err(KernelError::rank_mismatch(
                "gram_hadamard_except",
                rank,
                factor.ncols(),
                idx,
            ));
        }
        g *= &gram(factor);
    }
    Ok(g)
}
