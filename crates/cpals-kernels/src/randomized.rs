//! Randomized range finding for tensor compression
//!
//! Given a matrix A (m × n), find an orthonormal Q (m × ℓ) whose range
//! approximately contains the dominant column space of A:
//!
//! 1. Sample Y = A Ω with a Gaussian Ω (n × ℓ)
//! 2. Power iterations Y ← A (Aᵀ Y), re-conditioning Y and AᵀY with an LU
//!    factorization in between (cheaper than QR, same span)
//! 3. Q = orthonormal basis of Y
//!
//! The random stream is supplied by the caller so that compression is
//! reproducible under a fixed seed.
//!
//! # References
//!
//! - Halko, Martinsson, Tropp (2011), "Finding structure with randomness"

use crate::error::KernelResult;
use cpals_core::linalg::{lu_pl, qr_thin};
use cpals_core::Scalar;
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use scirs2_core::random::Rng;
use scirs2_core::StandardNormal;

/// Gaussian random matrix with i.i.d. N(0, 1) entries
pub fn random_gaussian<T: Scalar, R: Rng>(
    (rows, cols): (usize, usize),
    rng: &mut R,
) -> Array2<T> {
    Array2::from_shape_fn((rows, cols), |_| {
        let sample: f64 = rng.sample(StandardNormal);
        T::cast(sample)
    })
}

/// Randomized range finder with LU-conditioned power iterations
///
/// The basis has `min(target_rank + oversampling, m)` columns, fewer only
/// when A itself has fewer columns than that.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::Array2;
/// use scirs2_core::random::{rngs::StdRng, SeedableRng};
/// use cpals_kernels::randomized_range_finder;
///
/// let a = Array2::from_shape_fn((20, 30), |(i, j)| {
///     ((i * 7 + j * 3) % 13) as f64 + if i == j { 5.0 } else { 0.0 }
/// });
/// let mut rng = StdRng::seed_from_u64(7);
/// let q = randomized_range_finder(&a.view(), 2, 3, 2, &mut rng).unwrap();
/// assert_eq!(q.shape(), &[20, 5]);
/// ```
pub fn randomized_range_finder<T: Scalar, R: Rng>(
    matrix: &ArrayView2<T>,
    target_rank: usize,
    oversampling: usize,
    power_iterations: usize,
    rng: &mut R,
) -> KernelResult<Array2<T>> {
    let (m, n) = matrix.dim();
    let ell = (target_rank + oversampling).min(m);
    if ell < target_rank + oversampling {
        log::debug!(
            "range finder clamped to {} columns ({} rows, {} requested)",
            ell,
            m,
            target_rank + oversampling
        );
    }

    let omega = random_gaussian((n, ell), rng);
    let mut y = matrix.dot(&omega);

    for _ in 0..power_iterations {
        let basis = recondition(&y.view())?;
        let z = recondition(&matrix.t().dot(&basis).view())?;
        y = matrix.dot(&z);
    }

    Ok(qr_thin(&y.view())?)
}

/// Well-conditioned basis of the columns of `a`: `P · L`, or a QR basis
/// when the LU factorization is unavailable for this input
fn recondition<T: Scalar>(a: &ArrayView2<T>) -> KernelResult<Array2<T>> {
    match lu_pl(a) {
        Ok(pl) => Ok(pl),
        Err(_) => Ok(qr_thin(a)?),
    }
}
