//! N-mode (tensor-matrix) product
//!
//! For tensor X (I₁ × ... × Iₙ) and matrix U (J × Iₖ), the mode-k product
//! Y = X ×ₖ U has shape (I₁ × ... × Iₖ₋₁ × J × Iₖ₊₁ × ... × Iₙ):
//!
//! Y[i₁, ..., j, ..., iₙ] = Σ_{iₖ} X[i₁, ..., iₖ, ..., iₙ] × U[j, iₖ]
//!
//! Compression front-ends use it to project a tensor onto per-mode bases
//! before decomposing the much smaller core.

use crate::error::{KernelError, KernelResult};
use crate::mttkrp::unfold_view;
use cpals_core::Scalar;
use scirs2_core::ndarray_ext::{Array, ArrayView, ArrayView2, IxDyn};

/// Compute the n-mode product of a tensor and a matrix
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::{Array, Array2};
/// use cpals_kernels::nmode_product;
///
/// let tensor = Array::from_shape_vec(vec![2, 3, 4], (0..24).map(|x| x as f64).collect()).unwrap();
/// let u = Array2::<f64>::ones((5, 3));
/// let y = nmode_product(&tensor.view(), &u.view(), 1).unwrap();
/// assert_eq!(y.shape(), &[2, 5, 4]);
/// assert_eq!(y[[0, 0, 0]], 0.0 + 4.0 + 8.0);
/// ```
pub fn nmode_product<T: Scalar>(
    tensor: &ArrayView<T, IxDyn>,
    matrix: &ArrayView2<T>,
    mode: usize,
) -> KernelResult<Array<T, IxDyn>> {
    let shape = tensor.shape();
    if mode >= shape.len() {
        return Err(KernelError::invalid_mode(
            mode,
            shape.len(),
            "nmode_product",
        ));
    }
    if matrix.ncols() != shape[mode] {
        return Err(KernelError::dimension_mismatch(
            "nmode_product",
            vec![matrix.nrows(), shape[mode]],
            matrix.shape().to_vec(),
            format!("matrix columns must equal extent of mode {}", mode),
        ));
    }

    let unfolded = unfold_view(tensor, mode)?;
    let product = matrix.dot(&unfolded);

    let mut new_shape = shape.to_vec();
    new_shape[mode] = matrix.nrows();
    fold_matrix(product, &new_shape, mode)
}

/// Inverse of the mode-n unfolding
fn fold_matrix<T: Scalar>(
    matrix: scirs2_core::ndarray_ext::Array2<T>,
    shape: &[usize],
    mode: usize,
) -> KernelResult<Array<T, IxDyn>> {
    let mut inter_shape = Vec::with_capacity(shape.len());
    inter_shape.push(shape[mode]);
    inter_shape.extend(
        shape
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != mode)
            .map(|(_, &s)| s),
    );

    let inter = matrix
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order(IxDyn(&inter_shape))
        .map_err(|e| KernelError::operation_error("fold", e.to_string()))?;

    // axis 0 of `inter` is `mode`; the others keep their relative order
    let mut inv_perm = vec![0; shape.len()];
    let mut idx = 1;
    for (i, item) in inv_perm.iter_mut().enumerate() {
        if i != mode {
            *item = idx;
            idx += 1;
        }
    }

    Ok(inter
        .permuted_axes(IxDyn(&inv_perm))
        .as_standard_layout()
        .into_owned())
}
