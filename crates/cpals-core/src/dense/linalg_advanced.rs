//! Matrix factorizations on `DenseND` values
//!
//! These forward to [`crate::linalg`] after checking that the tensor is a
//! matrix. Calling any of them on a tensor of another order is a
//! configuration error ([`CoreError::NotAMatrix`]), raised before any
//! numeric work.

use crate::error::{CoreError, CoreResult};
use crate::linalg;
use crate::scalar::Scalar;
use crate::DenseND;
use scirs2_core::ndarray_ext::{ArrayView2, Ix2};

impl<T: Scalar> DenseND<T> {
    fn as_matrix(&self, op: &'static str) -> CoreResult<ArrayView2<'_, T>> {
        if self.order() != 2 {
            return Err(CoreError::NotAMatrix {
                op,
                order: self.order(),
            });
        }
        self.data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| CoreError::NotAMatrix {
                op,
                order: self.order(),
            })
    }

    /// `P · L` from an LU factorization with partial pivoting
    pub fn lu_pl(&self) -> CoreResult<DenseND<T>> {
        let m = self.as_matrix("lu")?;
        Ok(DenseND::from_array(linalg::lu_pl(&m)?.into_dyn()))
    }

    /// Thin orthonormal basis of the column space
    ///
    /// ```
    /// use cpals_core::DenseND;
    ///
    /// let a = DenseND::from_vec(vec![1.0, 0.0, 1.0, 1.0, 0.0, 2.0], &[3, 2]).unwrap();
    /// let q = a.qr_basis().unwrap();
    /// assert_eq!(q.shape(), &[3, 2]);
    ///
    /// let cube = DenseND::<f64>::zeros(&[2, 2, 2]);
    /// assert!(cube.qr_basis().is_err());
    /// ```
    pub fn qr_basis(&self) -> CoreResult<DenseND<T>> {
        let m = self.as_matrix("qr")?;
        Ok(DenseND::from_array(linalg::qr_thin(&m)?.into_dyn()))
    }

    /// Eigenvalues (ascending) and eigenvectors of a symmetric matrix
    pub fn eigh(&self) -> CoreResult<(DenseND<T>, DenseND<T>)> {
        let m = self.as_matrix("eigh")?;
        let (vals, vecs) = linalg::symmetric_eigen(&m)?;
        Ok((
            DenseND::from_array(vals.into_dyn()),
            DenseND::from_array(vecs.into_dyn()),
        ))
    }

    /// Thin SVD `(U, s, Vᵀ)`
    pub fn svd(&self) -> CoreResult<(DenseND<T>, DenseND<T>, DenseND<T>)> {
        let m = self.as_matrix("svd")?;
        let (u, s, vt) = linalg::svd_thin(&m)?;
        Ok((
            DenseND::from_array(u.into_dyn()),
            DenseND::from_array(s.into_dyn()),
            DenseND::from_array(vt.into_dyn()),
        ))
    }

    /// Pseudoinverse with singular values at or below `threshold` dropped
    pub fn pinv(&self, threshold: T) -> CoreResult<DenseND<T>> {
        let m = self.as_matrix("pinv")?;
        Ok(DenseND::from_array(
            linalg::pseudo_inverse(&m, threshold)?.into_dyn(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_only_routines_reject_tensors() {
        let t = DenseND::<f64>::ones(&[2, 2, 2]);
        for res in [
            t.lu_pl().map(|_| ()),
            t.qr_basis().map(|_| ()),
            t.eigh().map(|_| ()),
            t.svd().map(|_| ()),
            t.pinv(1e-13).map(|_| ()),
        ] {
            assert!(matches!(res, Err(CoreError::NotAMatrix { order: 3, .. })));
        }
    }

    #[test]
    fn test_pinv_of_diagonal() {
        let a = DenseND::from_vec(vec![2.0_f64, 0.0, 0.0, 4.0], &[2, 2]).unwrap();
        let p = a.pinv(1e-13).unwrap();
        assert!((p[&[0, 0][..]] - 0.5).abs() < 1e-12);
        assert!((p[&[1, 1][..]] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_eigh_shapes() {
        let a = DenseND::from_vec(vec![2.0_f64, 1.0, 1.0, 2.0], &[2, 2]).unwrap();
        let (vals, vecs) = a.eigh().unwrap();
        assert_eq!(vals.shape(), &[2]);
        assert_eq!(vecs.shape(), &[2, 2]);
        assert!((vals[&[0][..]] - 1.0).abs() < 1e-10);
        assert!((vals[&[1][..]] - 3.0).abs() < 1e-10);
    }
}
