//! The dense N-way array and its constructors
//!
//! This module defines the core `DenseND<T>` type and provides creation
//! and accessor methods. Shape manipulation and linear algebra live in
//! sibling modules.

use crate::error::{CoreError, CoreResult};
use scirs2_core::ndarray_ext::{Array, ArrayView, ArrayViewMut, Dimension, IxDyn};
use scirs2_core::numeric::Num;

/// Dense N-way array over a row-major `IxDyn` buffer
///
/// The tensor is the box-shaped array every decomposition works on: an
/// ordered list of per-mode extents over a row-major buffer.
///
/// # Memory Layout
///
/// Tensors built through [`DenseND::from_vec`], [`DenseND::zeros`] and
/// friends are C-contiguous (row-major). The direct contraction kernels
/// rely on that layout and fall back to a contiguous copy otherwise.
///
/// # Examples
///
/// ```
/// use cpals_core::DenseND;
///
/// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
/// assert_eq!(tensor.shape(), &[2, 3, 4]);
/// assert_eq!(tensor.order(), 3);
/// ```
#[derive(Clone, PartialEq)]
pub struct DenseND<T> {
    /// Row-major storage
    pub(crate) data: Array<T, IxDyn>,
}

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Wrap an existing array; its layout is kept as is
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::Array;
    /// use cpals_core::DenseND;
    ///
    /// let arr = Array::<f64, _>::zeros(vec![2, 3]);
    /// let tensor = DenseND::from_array(arr);
    /// assert_eq!(tensor.shape(), &[2, 3]);
    /// ```
    pub fn from_array(array: Array<T, IxDyn>) -> Self {
        Self { data: array }
    }

    /// Tensor over a row-major element buffer. The buffer length must be
    /// the product of the extents.
    ///
    /// # Examples
    ///
    /// ```
    /// use cpals_core::DenseND;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// let tensor = DenseND::from_vec(data, &[2, 3]).unwrap();
    /// assert_eq!(tensor.shape(), &[2, 3]);
    /// ```
    pub fn from_vec(vec: Vec<T>, shape: &[usize]) -> anyhow::Result<Self> {
        Ok(Self::try_from_vec(vec, shape)?)
    }

    /// Same as [`DenseND::from_vec`] with a typed error.
    pub fn try_from_vec(vec: Vec<T>, shape: &[usize]) -> CoreResult<Self> {
        let total: usize = shape.iter().product();
        if vec.len() != total {
            return Err(CoreError::ElementCount {
                shape: shape.to_vec(),
                expected: total,
                actual: vec.len(),
            });
        }
        let array =
            Array::from_shape_vec(IxDyn(shape), vec).map_err(|_| CoreError::ElementCount {
                shape: shape.to_vec(),
                expected: total,
                actual: total,
            })?;
        Ok(Self { data: array })
    }

    /// Tensor of zeros with the given extents
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// Tensor of ones with the given extents
    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// Tensor filled with `value`
    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// Build a tensor by evaluating `f` at every multi-index.
    ///
    /// ```
    /// use cpals_core::DenseND;
    ///
    /// let t = DenseND::<f64>::from_fn(&[2, 3], |idx| (idx[0] * 3 + idx[1]) as f64);
    /// assert_eq!(t[&[1, 2][..]], 5.0);
    /// ```
    pub fn from_fn<F>(shape: &[usize], mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> T,
    {
        Self {
            data: Array::from_shape_fn(IxDyn(shape), |idx| f(idx.slice())),
        }
    }

    /// Number of modes
    pub fn order(&self) -> usize {
        self.data.ndim()
    }

    /// Per-mode extents
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Element count, the product of the extents
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the tensor has zero elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check whether the buffer is in row-major order.
    pub fn is_contiguous(&self) -> bool {
        self.data.is_standard_layout()
    }

    /// Extent of a single mode
    pub fn extent(&self, mode: usize) -> CoreResult<usize> {
        self.shape()
            .get(mode)
            .copied()
            .ok_or(CoreError::InvalidMode {
                mode,
                order: self.order(),
            })
    }

    /// Read-only view of the whole tensor
    pub fn view(&self) -> ArrayView<'_, T, IxDyn> {
        self.data.view()
    }

    /// Mutable view of the whole tensor
    pub fn view_mut(&mut self) -> ArrayViewMut<'_, T, IxDyn> {
        self.data.view_mut()
    }

    /// Borrow the underlying array
    pub fn as_array(&self) -> &Array<T, IxDyn> {
        &self.data
    }

    /// Consume the tensor and return the underlying array
    pub fn into_array(self) -> Array<T, IxDyn> {
        self.data
    }

    /// Iterate over elements in logical (row-major) order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Elements in row-major order, copied into a new vector
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }
}
