//! Error type shared by every decomposition entry point

use cpals_core::CoreError;
use cpals_kernels::KernelError;
use thiserror::Error;

/// Errors raised by the CP-ALS engines.
///
/// Configuration variants are reported before any numeric work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CpError {
    #[error("Invalid rank: {0}")]
    InvalidRank(usize),

    #[error("Cannot shrink rank from {current} to {requested}")]
    RankShrink { current: usize, requested: usize },

    #[error("Invalid rank step: {0}")]
    InvalidStep(usize),

    #[error("Symmetry map has {actual} entries for a tensor of order {expected}")]
    SymmetryLength { expected: usize, actual: usize },

    #[error("Mode {mode} cannot alias mode {target}: {reason}")]
    InvalidSymmetry {
        mode: usize,
        target: usize,
        reason: &'static str,
    },

    #[error("Too few convergence tests: {panels} panels but {tests} tests")]
    TooFewConvergenceTests { panels: usize, tests: usize },

    #[error("Sweep cap must be positive")]
    InvalidIterationCap,

    #[error("Panel rank step must be positive and finite, got {0}")]
    InvalidPanelStep(f64),

    #[error("Connecting mode extents differ: left {left}, right {right}")]
    ConnectingExtentMismatch { left: usize, right: usize },

    #[error("Invalid tensor order: {0}")]
    InvalidOrder(String),

    #[error("Decomposition has not been computed")]
    NotComputed,

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for decomposition operations
pub type CpResult<T> = Result<T, CpError>;

impl CpError {
    /// Whether this error is a configuration error rather than a numeric one
    pub fn is_configuration(&self) -> bool {
        !matches!(self, CpError::Kernel(_) | CpError::Core(_))
    }
}
