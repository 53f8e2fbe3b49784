//! # cpals-decomp
//!
//! CP decomposition by alternating least squares.
//!
//! ## Overview
//!
//! A CP decomposition writes an N-way tensor as a weighted sum of rank-1
//! terms:
//!
//! ```text
//! X ≈ Σᵣ λᵣ (a₀ᵣ ⊗ a₁ᵣ ⊗ ... ⊗ a_{N-1}ᵣ)
//! ```
//!
//! [`CpAls`] computes one, mode by mode, and offers several ways to reach a
//! rank:
//!
//! - [`CpAls::compute_rank`]: grow the rank by a fixed step, ALS at each stage
//! - [`CpAls::compute_rank_random`]: straight to the target rank
//! - [`CpAls::compute_error`]: grow until an error target is met
//! - [`CpAls::compute_geometric`]: geometric rank growth
//! - [`CpAls::compute_pals`]: panel growth from an SVD initial guess
//! - [`CpAls::compress_compute_tucker`], [`CpAls::compress_compute_rand`]:
//!   decompose a compressed core and map back
//!
//! The tensor is read through a [`TensorSource`]. [`DenseSource`] borrows a
//! dense tensor; [`PairSource`] represents the contraction of two tensors
//! over their first mode without ever forming it.
//!
//! Stopping is decided by a [`ConvergenceTest`]: [`NormCheck`] compares
//! factors between sweeps, [`FitCheck`] tracks the fit.
//!
//! ## Quick Start
//!
//! ```
//! use cpals_core::DenseND;
//! use cpals_decomp::{AlsOptions, CpAls, FitCheck};
//!
//! let tensor = DenseND::<f64>::from_fn(&[6, 5, 4], |i| {
//!     (i[0] + 1) as f64 * (i[1] as f64 - 2.0) * (i[2] + 2) as f64
//!         + (i[0] * i[2]) as f64
//! });
//!
//! let mut cp = CpAls::new(&tensor).with_options(AlsOptions::default().with_seed(42));
//! let mut test = FitCheck::new(1e-10);
//! let error = cp.compute_rank(3, &mut test, 1)?;
//!
//! println!("rank {} error {:?}", cp.rank(), error);
//! let approx = cp.reconstruct()?;
//! assert_eq!(approx.shape(), tensor.shape());
//! # Ok::<(), cpals_decomp::CpError>(())
//! ```
//!
//! ## Two-tensor input
//!
//! ```
//! use cpals_core::DenseND;
//! use cpals_decomp::{CpAls, NormCheck};
//!
//! let left = DenseND::<f64>::from_fn(&[3, 4], |i| (i[0] + i[1]) as f64);
//! let right = DenseND::<f64>::from_fn(&[3, 5, 2], |i| (i[0] * i[2]) as f64 + 1.0);
//!
//! // decomposes the 4 × 5 × 2 contraction over the shared mode
//! let mut cp = CpAls::from_pair(&left, &right)?;
//! cp.compute_rank(2, &mut NormCheck::new(1e-8), 1)?;
//! assert_eq!(cp.factors()?.len(), 3);
//! # Ok::<(), cpals_decomp::CpError>(())
//! ```
//!
//! ## References
//!
//! - Kolda & Bader (2009), "Tensor Decompositions and Applications"
//! - Phan, Tichavský, Cichocki (2013), "Fast Alternating LS Algorithms for
//!   High Order CANDECOMP/PARAFAC Tensor Factorizations"

pub mod compression;
pub mod convergence;
pub mod cp;
pub mod decomp;
pub mod df;
pub mod error;
pub mod options;
pub mod rals;
pub mod source;

#[cfg(test)]
mod property_tests;

pub use convergence::{ConvergenceTest, FitCheck, NormCheck};
pub use cp::{AlsRun, CpAls, EngineState};
pub use decomp::{solve_normal_equations, CpDecomp, SolveStrategy};
pub use df::{PairSource, Side};
pub use error::{CpError, CpResult};
pub use options::{AlsOptions, CompressionOptions, ContractionMethod, RalsOptions};
pub use rals::{decay_damping, RalsHelper};
pub use source::{DenseSource, TensorSource};
