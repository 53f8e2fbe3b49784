//! Kernel errors
//!
//! Kernels check operand shapes before touching any data, so a bad factor
//! set fails at the call that received it. Every variant names the kernel
//! (`op`) that rejected its input.

use cpals_core::CoreError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Extents that do not line up
    DimensionMismatch {
        op: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
        detail: String,
    },

    /// Mode index at or past the order
    InvalidMode {
        mode: usize,
        order: usize,
        detail: String,
    },

    /// Factor `factor` has a column count other than the rank
    RankMismatch {
        op: &'static str,
        factor: usize,
        expected: usize,
        found: usize,
    },

    /// A required operand was empty
    EmptyInput { op: &'static str, what: String },

    /// Failure of a linear-algebra primitive
    Core(CoreError),

    /// Anything else, e.g. a failed reshape
    Operation { op: &'static str, message: String },
}

pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    pub fn dimension_mismatch(
        op: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
        detail: impl Into<String>,
    ) -> Self {
        Self::DimensionMismatch {
            op,
            expected,
            found,
            detail: detail.into(),
        }
    }

    pub fn invalid_mode(mode: usize, order: usize, detail: impl Into<String>) -> Self {
        Self::InvalidMode {
            mode,
            order,
            detail: detail.into(),
        }
    }

    pub fn rank_mismatch(op: &'static str, expected: usize, found: usize, factor: usize) -> Self {
        Self::RankMismatch {
            op,
            factor,
            expected,
            found,
        }
    }

    pub fn empty_input(op: &'static str, what: impl Into<String>) -> Self {
        Self::EmptyInput {
            op,
            what: what.into(),
        }
    }

    pub fn operation_error(op: &'static str, message: impl Into<String>) -> Self {
        Self::Operation {
            op,
            message: message.into(),
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                op,
                expected,
                found,
                detail,
            } => write!(f, "{op}: expected extents {expected:?}, found {found:?} ({detail})"),
            Self::InvalidMode { mode, order, detail } => {
                write!(f, "mode {mode} out of range for order {order} ({detail})")
            }
            Self::RankMismatch {
                op,
                factor,
                expected,
                found,
            } => write!(f, "{op}: factor {factor} has {found} columns, rank is {expected}"),
            Self::EmptyInput { op, what } => write!(f, "{op}: {what} must not be empty"),
            Self::Core(err) => fmt::Display::fmt(err, f),
            Self::Operation { op, message } => write!(f, "{op}: {message}"),
        }
    }
}

impl std::error::Error for KernelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoreError> for KernelError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}
