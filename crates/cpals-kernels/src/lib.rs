//! # cpals-kernels
//!
//! Tensor kernels behind the CP-ALS mode update.
//!
//! - **Khatri-Rao product** ([`khatri_rao`], [`khatri_rao_except`]): the
//!   operand of the indirect update
//! - **Gram Hadamard** ([`gram_hadamard_except`]): the normal-equations
//!   matrix of a mode update
//! - **MTTKRP** ([`mttkrp_indirect`], [`mttkrp_direct`]): the two
//!   interchangeable ways of computing the right-hand side, plus the
//!   building blocks ([`contract_leading_mode`], [`reduce_except`]) reused
//!   for implicitly represented tensors
//! - **N-mode products** ([`nmode_product`]) for compression
//! - **Reconstruction** ([`cp_reconstruct`]) for error reporting
//! - **Randomized range finder** ([`randomized_range_finder`])
//!
//! ## Quick Start
//!
//! ```rust
//! use scirs2_core::ndarray_ext::{Array, Array2};
//! use cpals_kernels::{khatri_rao, mttkrp_direct, nmode_product};
//!
//! let a = Array2::<f64>::ones((10, 5));
//! let b = Array2::<f64>::ones((8, 5));
//! let kr = khatri_rao(&a.view(), &b.view()).unwrap();
//! assert_eq!(kr.shape(), &[80, 5]);
//!
//! let tensor = Array::<f64, _>::ones(vec![3, 4, 5]);
//! let matrix = Array2::<f64>::ones((2, 3));
//! let projected = nmode_product(&tensor.view(), &matrix.view(), 0).unwrap();
//! assert_eq!(projected.shape(), &[2, 4, 5]);
//!
//! let factors = vec![
//!     Array2::<f64>::ones((3, 2)),
//!     Array2::<f64>::ones((4, 2)),
//!     Array2::<f64>::ones((5, 2)),
//! ];
//! let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
//! let m = mttkrp_direct(&tensor.view(), &views, 1).unwrap();
//! assert_eq!(m.shape(), &[4, 2]);
//! assert_eq!(m[[0, 0]], 15.0);
//! ```

pub mod error;
pub mod hadamard;
pub mod khatri_rao;
pub mod mttkrp;
pub mod nmode;
pub mod outer;
pub mod randomized;


pub use error::{KernelError, KernelResult};
pub use hadamard::*;
pub use khatri_rao::*;
pub use mttkrp::*;
pub use nmode::*;
pub use outer::*;
pub use randomized::*;
