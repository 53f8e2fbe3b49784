//! Dense tensor implementation
//!
//! The type itself lives in [`types`]; shape handling and matrix
//! factorizations are split into their own modules.

pub mod types;

mod linalg_advanced;
mod shape_ops;

pub mod densend_traits;

pub use types::DenseND;
