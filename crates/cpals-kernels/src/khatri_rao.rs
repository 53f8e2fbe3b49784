//! Khatri-Rao product (column-wise Kronecker product)
//!
//! For matrices A (I × K) and B (J × K), the Khatri-Rao product C = A ⊙ B
//! has size (I*J × K) and row `i*J + j` of C is the elementwise product of
//! row `i` of A and row `j` of B. This is the operand of the indirect
//! per-mode update: the unfolded tensor times the Khatri-Rao product of
//! every other factor.

use crate::error::{KernelError, KernelResult};
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use scirs2_core::numeric::Num;

/// Compute the Khatri-Rao product of two matrices
///
/// # Complexity
///
/// Time: O(I * J * K)
/// Space: O(I * J * K)
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use cpals_kernels::khatri_rao;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]];  // 2×2
/// let b = array![[5.0, 6.0], [7.0, 8.0]];  // 2×2
/// let c = khatri_rao(&a.view(), &b.view()).unwrap();  // 4×2
/// assert_eq!(c.shape(), &[4, 2]);
///
/// // First column: [1*5, 1*7, 3*5, 3*7]
/// assert_eq!(c[[0, 0]], 5.0);
/// assert_eq!(c[[1, 0]], 7.0);
/// assert_eq!(c[[2, 0]], 15.0);
/// assert_eq!(c[[3, 0]], 21.0);
/// ```
pub fn khatri_rao<T>(a: &ArrayView2<T>, b: &ArrayView2<T>) -> KernelResult<Array2<T>>
where
    T: Copy + Num,
{
    let (i, k1) = a.dim();
    let (j, k2) = b.dim();

    if k1 != k2 {
        return Err(KernelError::dimension_mismatch(
            "khatri_rao",
            vec![k1],
            vec![k2],
            "Number of columns must match",
        ));
    }

    let mut result = Array2::<T>::zeros((i * j, k1));
    for (row_a_idx, a_row) in a.outer_iter().enumerate() {
        for (row_b_idx, b_row) in b.outer_iter().enumerate() {
            let mut out = result.row_mut(row_a_idx * j + row_b_idx);
            for ((o, &x), &y) in out.iter_mut().zip(a_row.iter()).zip(b_row.iter()) {
                *o = x * y;
            }
        }
    }

    Ok(result)
}

/// Khatri-Rao product of every factor except `skip`, in forward mode order.
///
/// The row index runs over the remaining modes with the lowest mode
/// varying slowest, which matches the column order of
/// [`DenseND::unfold`](cpals_core::DenseND::unfold). With no remaining
/// factor the result is a single row of ones.
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use cpals_kernels::khatri_rao_except;
///
/// let a = array![[1.0], [2.0]];
/// let b = array![[3.0], [4.0], [5.0]];
/// let c = array![[6.0], [7.0]];
/// let k = khatri_rao_except(&[a.view(), b.view(), c.view()], 1).unwrap();
/// assert_eq!(k.shape(), &[4, 1]);
/// assert_eq!(k[[1, 0]], 7.0);  // a[0] * c[1]
/// assert_eq!(k[[2, 0]], 12.0); // a[1] * c[0]
/// ```
pub fn khatri_rao_except<T>(factors: &[ArrayView2<T>], skip: usize) -> KernelResult<Array2<T>>
where
    T: Copy + Num,
{
    if skip >= factors.len() {
        return Err(KernelError::invalid_mode(
            skip,
            factors.len(),
            "khatri_rao_except",
        ));
    }
    let rank = factors[skip].ncols();

    let mut acc: Option<Array2<T>> = None;
    for (idx, factor) in factors.iter().enumerate() {
        if idx == skip {
            continue;
        }
        if factor.ncols() != rank {
            return Err(KernelError::rank_mismatch(
                "khatri_rao_except",
                rank,
                factor.ncols(),
                idx,
            ));
        }
        acc = Some(match acc {
            None => factor.to_owned(),
            Some(prev) => khatri_rao(&prev.view(), factor)?,
        });
    }

    Ok(acc.unwrap_or_else(|| Array2::ones((1, rank))))
}
