//! Matrix primitives used by the decomposition engines
//!
//! Thin wrappers around `scirs2-linalg` that fix the conventions the ALS
//! code relies on:
//!
//! - [`lu_pl`]: LU with partial pivoting, returning the permuted lower factor
//! - [`qr_thin`]: orthonormal basis of the column space
//! - [`symmetric_eigen`]: eigenpairs of a symmetric matrix, ascending
//! - [`svd_thin`]: thin singular value decomposition
//! - [`pseudo_inverse`]: SVD based pseudoinverse with an explicit cutoff
//! - [`cholesky_solve`]: solve `X · G = B` for symmetric positive definite `G`
//!
//! Failures are reported through [`CoreError`], never through the values.

use crate::error::{CoreError, CoreResult};
use crate::scalar::Scalar;
use scirs2_core::ndarray_ext::{s, Array1, Array2, ArrayView2};

/// LU factorization with partial pivoting, returning `P · L`.
///
/// With `A = P · L · U` the returned `m × min(m, n)` matrix spans the column
/// space of `A` and is well conditioned, which is what the randomized power
/// iterations need between multiplications. Tall and wide inputs are both
/// accepted.
pub fn lu_pl<T: Scalar>(a: &ArrayView2<T>) -> CoreResult<Array2<T>> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Ok(Array2::zeros((m, m.min(n))));
    }
    let (p, l, u) = scirs2_linalg::lu(a, None).map_err(|e| CoreError::factorization("lu", e))?;
    let k = m.min(n).min(l.ncols()).min(u.nrows());
    let l = l.slice(s![.., ..k]);
    let u = u.slice(s![..k, ..]);

    // backends differ on A = P·L·U versus P·A = L·U
    let pl = p.dot(&l);
    let scale = a.iter().fold(T::one(), |acc, x| acc.max(x.abs()));
    let tol = T::cast(1e-8) * scale;
    let reproduces = pl
        .dot(&u)
        .iter()
        .zip(a.iter())
        .all(|(x, y)| (*x - *y).abs() <= tol);
    let pl = if reproduces { pl } else { p.t().dot(&l) };
    if pl.iter().any(|x| !x.is_finite()) {
        return Err(CoreError::Factorization {
            op: "lu",
            message: "non-finite factor".to_string(),
        });
    }
    Ok(pl)
}

/// Orthonormal basis of the column space of `a` (`m × min(m, n)`).
pub fn qr_thin<T: Scalar>(a: &ArrayView2<T>) -> CoreResult<Array2<T>> {
    let (m, n) = a.dim();
    let (q, _r) = scirs2_linalg::qr(a, None).map_err(|e| CoreError::factorization("qr", e))?;
    let k = m.min(n).min(q.ncols());
    Ok(q.slice(s![.., ..k]).to_owned())
}

/// Eigenpairs of a symmetric matrix.
///
/// Eigenvalues come back in ascending order; column `j` of the second
/// element is the eigenvector of eigenvalue `j`.
pub fn symmetric_eigen<T: Scalar>(a: &ArrayView2<T>) -> CoreResult<(Array1<T>, Array2<T>)> {
    let (vals, vecs) =
        scirs2_linalg::eigh(a, None).map_err(|e| CoreError::factorization("eigh", e))?;

    // make the ordering explicit instead of trusting the backend
    let mut order: Vec<usize> = (0..vals.len()).collect();
    order.sort_by(|&i, &j| {
        vals[i]
            .partial_cmp(&vals[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if order.iter().enumerate().all(|(k, &i)| k == i) {
        return Ok((vals, vecs));
    }
    let sorted_vals = Array1::from_iter(order.iter().map(|&i| vals[i]));
    let mut sorted_vecs = Array2::zeros(vecs.raw_dim());
    for (k, &i) in order.iter().enumerate() {
        sorted_vecs.column_mut(k).assign(&vecs.column(i));
    }
    Ok((sorted_vals, sorted_vecs))
}

/// Thin SVD `a = U · diag(s) · Vᵀ`, singular values descending.
pub fn svd_thin<T: Scalar>(a: &ArrayView2<T>) -> CoreResult<(Array2<T>, Array1<T>, Array2<T>)> {
    scirs2_linalg::svd(a, false, None).map_err(|e| CoreError::factorization("svd", e))
}

/// Moore-Penrose pseudoinverse through the SVD.
///
/// Singular values at or below `threshold` are treated as zero, which makes
/// the result well defined for rank-deficient input.
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use cpals_core::linalg::pseudo_inverse;
///
/// let a = array![[2.0_f64, 0.0], [0.0, 0.0]];
/// let p = pseudo_inverse(&a.view(), 1e-13).unwrap();
/// assert!((p[[0, 0]] - 0.5).abs() < 1e-12);
/// assert!(p[[1, 1]].abs() < 1e-12);
/// ```
pub fn pseudo_inverse<T: Scalar>(a: &ArrayView2<T>, threshold: T) -> CoreResult<Array2<T>> {
    let (u, sv, vt) = svd_thin(a)?;
    let k = sv.len();
    let mut v_scaled = vt.slice(s![..k, ..]).t().to_owned();
    for (j, &sigma) in sv.iter().enumerate() {
        let inv = if sigma > threshold {
            T::one() / sigma
        } else {
            T::zero()
        };
        v_scaled.column_mut(j).mapv_inplace(|x| x * inv);
    }
    Ok(v_scaled.dot(&u.slice(s![.., ..k]).t()))
}

/// Solve `X · G = B` for `X` with `G` symmetric positive definite.
///
/// Uses `G = L · Lᵀ` and two triangular solves on `Xᵀ`. Returns
/// [`CoreError::NotPositiveDefinite`] when the factorization breaks down
/// or produces non-finite values, so the caller can fall back to
/// [`pseudo_inverse`].
pub fn cholesky_solve<T: Scalar>(g: &ArrayView2<T>, b: &ArrayView2<T>) -> CoreResult<Array2<T>> {
    let n = g.nrows();
    if g.ncols() != n || b.ncols() != n {
        return Err(CoreError::ShapeMismatch {
            op: "cholesky_solve",
            left: g.shape().to_vec(),
            right: b.shape().to_vec(),
        });
    }
    let l = scirs2_linalg::cholesky(g, None).map_err(|_| CoreError::NotPositiveDefinite)?;
    if (0..n).any(|i| !(l[[i, i]] > T::zero()) || !l[[i, i]].is_finite()) {
        return Err(CoreError::NotPositiveDefinite);
    }

    // Y = L⁻¹ Bᵀ, then Z = L⁻ᵀ Y, X = Zᵀ
    let bt = b.t().as_standard_layout().into_owned();
    // scirs2-linalg solves one right-hand side at a time, so go column by column
    let mut y = Array2::<T>::zeros(bt.raw_dim());
    for (j, col) in bt.columns().into_iter().enumerate() {
        let yj = scirs2_linalg::solve_triangular(&l.view(), &col, true, false)
            .map_err(|_| CoreError::NotPositiveDefinite)?;
        y.column_mut(j).assign(&yj);
    }
    let lt = l.t().as_standard_layout().into_owned();
    let mut z = Array2::<T>::zeros(y.raw_dim());
    for (j, col) in y.columns().into_iter().enumerate() {
        let zj = scirs2_linalg::solve_triangular(&lt.view(), &col, false, false)
            .map_err(|_| CoreError::NotPositiveDefinite)?;
        z.column_mut(j).assign(&zj);
    }
    if z.iter().any(|x| !x.is_finite()) {
        return Err(CoreError::NotPositiveDefinite);
    }
    // row-major, so callers can reshape the factors freely
    Ok(z.t().as_standard_layout().into_owned())
}
