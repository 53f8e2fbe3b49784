//! # cpals-core
//!
//! Dense N-way arrays and the linear-algebra primitives used by the CP-ALS
//! engines.
//!
//! - **Dense tensor representation** ([`DenseND`]): per-mode extents over a
//!   row-major buffer, multi-index access, bounded sub-views
//! - **Scoped reinterpretation**: reshaped and matricized views that never
//!   change the shape of the tensor they borrow from
//! - **Matrix primitives** ([`linalg`]): LU, QR, symmetric eigen, SVD,
//!   pseudoinverse and Cholesky solves, all reporting failure through
//!   [`CoreError`]
//! - **Element trait** ([`Scalar`]): the bound every engine is generic over
//!
//! ## SciRS2 Integration
//!
//! Arrays and numeric traits come from `scirs2-core`, factorizations from
//! `scirs2-linalg`.
//!
//! ## Quick Start
//!
//! ```
//! use cpals_core::DenseND;
//!
//! let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
//! assert_eq!(tensor.shape(), &[2, 3, 4]);
//! assert_eq!(tensor.order(), 3);
//!
//! // mode-1 matricization
//! let m = tensor.unfold(1).unwrap();
//! assert_eq!(m.shape(), &[3, 8]);
//! ```

pub mod dense;
pub mod error;
pub mod linalg;
pub mod scalar;


pub use dense::DenseND;
pub use error::{CoreError, CoreResult};
pub use scalar::Scalar;
