//! # cpals - CP decomposition by alternating least squares
//!
//! This is the **meta crate** that re-exports every cpals component.
//!
//! ## Quick Start
//!
//! ```
//! use cpals::prelude::*;
//!
//! let tensor = DenseND::<f64>::from_fn(&[4, 3, 2], |i| {
//!     (i[0] + 1) as f64 * (i[1] + 1) as f64 * (i[2] + 2) as f64
//! });
//! let mut cp = CpAls::new(&tensor).with_options(AlsOptions::default().with_seed(1));
//! let error = cp.compute_rank(1, &mut NormCheck::new(1e-10), 1)?;
//! assert!(error.unwrap() < 1e-8);
//! # Ok::<(), CpError>(())
//! ```
//!
//! ## Components
//!
//! ### Dense tensors ([`core`])
//!
//! N-way arrays, scoped reshaped and matricized views, and the matrix
//! factorizations the engines need.
//!
//! ```
//! use cpals::core::DenseND;
//!
//! let tensor = DenseND::<f64>::ones(&[2, 3, 4]);
//! let reshaped = tensor.reshape(&[6, 4]).unwrap();
//! assert_eq!(reshaped.shape(), &[6, 4]);
//! ```
//!
//! ### Kernels ([`kernels`])
//!
//! Khatri-Rao products, Gram Hadamard products, direct and indirect MTTKRP,
//! n-mode products and reconstruction.
//!
//! ```
//! use cpals::kernels::khatri_rao;
//! use scirs2_core::ndarray_ext::Array2;
//!
//! let a = Array2::<f64>::ones((10, 5));
//! let b = Array2::<f64>::ones((8, 5));
//! let kr = khatri_rao(&a.view(), &b.view()).unwrap();
//! assert_eq!(kr.shape(), &[80, 5]);
//! ```
//!
//! ### Decomposition ([`decomp`])
//!
//! The CP-ALS engine over dense tensors and over the contraction of two
//! tensors, rank-growth and panel strategies, convergence policies and
//! compression front-ends.
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for the option types

pub use cpals_core as core;
pub use cpals_decomp as decomp;
pub use cpals_kernels as kernels;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use cpals::prelude::*;
    //!
    //! let tensor = DenseND::<f64>::zeros(&[10, 20, 30]);
    //! let cp = CpAls::new(&tensor);
    //! assert_eq!(cp.state(), EngineState::Uninitialized);
    //! ```

    // Core types
    pub use crate::core::{DenseND, Scalar};

    // Engine and policies
    pub use crate::decomp::{
        AlsOptions, CompressionOptions, ContractionMethod, ConvergenceTest, CpAls, CpDecomp,
        CpError, CpResult, EngineState, FitCheck, NormCheck, RalsOptions, TensorSource,
    };

    // Common kernels
    pub use crate::kernels::{
        cp_reconstruct, gram_hadamard_except, khatri_rao, mttkrp_direct, mttkrp_indirect,
        nmode_product,
    };
}
