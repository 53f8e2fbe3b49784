//! Shape operations on tensors
//!
//! Every reinterpretation here is a scoped view or a fresh allocation: the
//! extents of the tensor a view was taken from never change, so callers can
//! hand their arrays to a decomposition without getting them back reshaped.

use super::types::DenseND;
use crate::error::{CoreError, CoreResult};
use crate::scalar::Scalar;
use scirs2_core::ndarray::Slice;
use scirs2_core::ndarray_ext::{Array2, ArrayView, ArrayView2, Ix2, IxDyn};
use scirs2_core::numeric::Num;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Reinterpret the tensor under new extents with the same element count.
    ///
    /// The returned view borrows the tensor; its own shape is untouched.
    ///
    /// ```
    /// use cpals_core::DenseND;
    ///
    /// let t = DenseND::<f64>::zeros(&[2, 3, 4]);
    /// let v = t.reshaped_view(&[6, 4]).unwrap();
    /// assert_eq!(v.shape(), &[6, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// ```
    pub fn reshaped_view(&self, shape: &[usize]) -> CoreResult<ArrayView<'_, T, IxDyn>> {
        let count: usize = shape.iter().product();
        if count != self.len() {
            return Err(CoreError::ElementCount {
                shape: shape.to_vec(),
                expected: count,
                actual: self.len(),
            });
        }
        self.data
            .view()
            .into_shape_with_order(IxDyn(shape))
            .map_err(|_| CoreError::ShapeMismatch {
                op: "reshaped_view",
                left: self.shape().to_vec(),
                right: shape.to_vec(),
            })
    }

    /// Matrix view of the row-major buffer, `rows * cols == len()`.
    pub fn matrix_view(&self, rows: usize, cols: usize) -> CoreResult<ArrayView2<'_, T>> {
        let view = self.reshaped_view(&[rows, cols])?;
        view.into_dimensionality::<Ix2>()
            .map_err(|_| CoreError::NotAMatrix {
                op: "matrix_view",
                order: self.order(),
            })
    }

    /// Owned copy under new extents.
    pub fn reshape(&self, shape: &[usize]) -> CoreResult<Self> {
        if let Ok(view) = self.reshaped_view(shape) {
            return Ok(Self::from_array(view.to_owned()));
        }
        Self::try_from_vec(self.to_vec(), shape)
    }

    /// Mode-`n` matricization: row `i` holds every element with index `i`
    /// on mode `n`, the remaining modes flattened in row-major order.
    ///
    /// ```
    /// use cpals_core::DenseND;
    ///
    /// let t = DenseND::<f64>::from_fn(&[2, 3, 4], |i| (i[0] * 12 + i[1] * 4 + i[2]) as f64);
    /// let m = t.unfold(1).unwrap();
    /// assert_eq!(m.shape(), &[3, 8]);
    /// assert_eq!(m[[1, 0]], 4.0);
    /// assert_eq!(m[[1, 4]], 16.0);
    /// ```
    pub fn unfold(&self, mode: usize) -> CoreResult<Array2<T>> {
        let rows = self.extent(mode)?;
        let cols: usize = self
            .shape()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != mode)
            .map(|(_, &s)| s)
            .product();

        let mut perm: Vec<usize> = vec![mode];
        perm.extend((0..mode).chain((mode + 1)..self.order()));

        let permuted = self.data.view().permuted_axes(IxDyn(&perm));
        let contiguous = permuted.as_standard_layout().into_owned();
        contiguous
            .into_shape_with_order((rows, cols))
            .map_err(|_| CoreError::ElementCount {
                shape: vec![rows, cols],
                expected: rows * cols,
                actual: self.len(),
            })
    }

    /// Box-shaped sub-view `lower[i]..upper[i]` on every mode.
    pub fn sub_view(&self, lower: &[usize], upper: &[usize]) -> CoreResult<ArrayView<'_, T, IxDyn>> {
        let fits = lower.len() == self.order()
            && upper.len() == self.order()
            && lower
                .iter()
                .zip(upper)
                .zip(self.shape())
                .all(|((&lo, &hi), &ext)| lo <= hi && hi <= ext);
        if !fits {
            return Err(CoreError::OutOfBounds {
                lower: lower.to_vec(),
                upper: upper.to_vec(),
                shape: self.shape().to_vec(),
            });
        }
        Ok(self
            .data
            .slice_each_axis(|ax| Slice::from(lower[ax.axis.index()]..upper[ax.axis.index()])))
    }

    /// Overwrite every element with `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Scalar> DenseND<T> {
    /// Sum of squared elements
    pub fn squared_norm(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &x| acc + x * x)
    }

    /// Frobenius norm
    pub fn frobenius_norm(&self) -> T {
        self.squared_norm().sqrt()
    }

    /// Frobenius norm of `self - other`.
    pub fn residual_norm(&self, other: &Self) -> CoreResult<T> {
        if self.shape() != other.shape() {
            return Err(CoreError::ShapeMismatch {
                op: "residual_norm",
                left: self.shape().to_vec(),
                right: other.shape().to_vec(),
            });
        }
        let sq = self
            .data
            .iter()
            .zip(other.data.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc + (a - b) * (a - b));
        Ok(sq.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota(shape: &[usize]) -> DenseND<f64> {
        let n: usize = shape.iter().product();
        DenseND::from_vec((0..n).map(|x| x as f64).collect(), shape).unwrap()
    }

    #[test]
    fn test_reshaped_view_keeps_source_shape() {
        let t = iota(&[2, 3, 4]);
        let m = t.matrix_view(6, 4).unwrap();
        assert_eq!(m[[5, 3]], 23.0);
        assert_eq!(t.shape(), &[2, 3, 4]);
    }

    #[test]
    fn test_reshaped_view_rejects_wrong_count() {
        let t = iota(&[2, 3]);
        assert!(matches!(
            t.reshaped_view(&[4, 2]),
            Err(CoreError::ElementCount { .. })
        ));
    }

    #[test]
    fn test_unfold_mode_zero_is_plain_reshape() {
        let t = iota(&[3, 2, 2]);
        let m = t.unfold(0).unwrap();
        assert_eq!(m.shape(), &[3, 4]);
        assert_eq!(m[[2, 3]], 11.0);
    }

    #[test]
    fn test_unfold_last_mode() {
        let t = iota(&[2, 3, 4]);
        let m = t.unfold(2).unwrap();
        assert_eq!(m.shape(), &[4, 6]);
        // m[k, i*3 + j] == t[i, j, k]
        assert_eq!(m[[3, 5]], t[&[1, 2, 3][..]]);
        assert_eq!(m[[1, 2]], t[&[0, 2, 1][..]]);
    }

    #[test]
    fn test_sub_view_bounds() {
        let t = iota(&[3, 4]);
        let v = t.sub_view(&[1, 1], &[3, 3]).unwrap();
        assert_eq!(v.shape(), &[2, 2]);
        assert_eq!(v[IxDyn(&[0, 0])], 5.0);
        assert!(t.sub_view(&[0, 0], &[4, 1]).is_err());
    }

    #[test]
    fn test_norms() {
        let a = DenseND::from_vec(vec![3.0_f64, 4.0], &[2]).unwrap();
        let b = DenseND::from_vec(vec![0.0, 0.0], &[2]).unwrap();
        assert!((a.frobenius_norm() - 5.0).abs() < 1e-12);
        assert!((a.residual_norm(&b).unwrap() - 5.0).abs() < 1e-12);

        let mut c = DenseND::<f64>::zeros(&[2]);
        c.fill(1.0);
        assert_eq!(c.to_vec(), vec![1.0, 1.0]);
        assert!(a.residual_norm(&DenseND::zeros(&[3])).is_err());
    }
}
