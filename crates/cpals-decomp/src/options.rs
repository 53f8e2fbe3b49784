//! Engine configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the per-mode MTTKRP is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContractionMethod {
    /// Sequential contraction, never forming the Khatri-Rao matrix
    #[default]
    Direct,
    /// Materialized Khatri-Rao product and one matrix product
    KhatriRao,
}

/// Regularized ALS settings
///
/// Each mode update is damped towards the previous factor with weight
/// `λₙ`, which starts at `initial_damping` and shrinks as the relative
/// step `s` of that mode shrinks: `λₙ ← λₙ · s / (s + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RalsOptions {
    pub initial_damping: f64,
}

impl Default for RalsOptions {
    fn default() -> Self {
        Self {
            initial_damping: 1.0,
        }
    }
}

/// Options for one CP-ALS engine
///
/// # Examples
///
/// ```
/// use cpals_decomp::{AlsOptions, ContractionMethod};
///
/// let opts = AlsOptions::default()
///     .with_max_sweeps(200)
///     .with_method(ContractionMethod::KhatriRao)
///     .with_seed(7);
/// assert_eq!(opts.max_sweeps, 200);
/// assert!(opts.fast_pseudoinverse);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlsOptions {
    /// Cap on sweeps per ALS run; zero is rejected
    pub max_sweeps: usize,
    pub method: ContractionMethod,
    /// Try a Cholesky solve before the SVD pseudoinverse
    pub fast_pseudoinverse: bool,
    /// Singular values at or below this are dropped by the pseudoinverse
    pub svd_threshold: f64,
    /// Report the residual after each ALS run
    pub calculate_error: bool,
    /// Seed for initial guesses and rank padding; drawn from the thread
    /// generator when unset
    pub seed: Option<u64>,
    pub regularization: Option<RalsOptions>,
}

impl Default for AlsOptions {
    fn default() -> Self {
        Self {
            max_sweeps: 10_000,
            method: ContractionMethod::Direct,
            fast_pseudoinverse: true,
            svd_threshold: 1e-13,
            calculate_error: true,
            seed: None,
            regularization: None,
        }
    }
}

impl AlsOptions {
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn with_method(mut self, method: ContractionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_fast_pseudoinverse(mut self, enabled: bool) -> Self {
        self.fast_pseudoinverse = enabled;
        self
    }

    pub fn with_svd_threshold(mut self, threshold: f64) -> Self {
        self.svd_threshold = threshold;
        self
    }

    pub fn with_calculate_error(mut self, enabled: bool) -> Self {
        self.calculate_error = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_regularization(mut self, rals: RalsOptions) -> Self {
        self.regularization = Some(rals);
        self
    }
}

/// Settings of the randomized compression front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompressionOptions {
    /// Extra columns sampled beyond the compressed extent
    pub oversampling: usize,
    pub power_iterations: usize,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            oversampling: 10,
            power_iterations: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = AlsOptions::default();
        assert_eq!(opts.max_sweeps, 10_000);
        assert_eq!(opts.method, ContractionMethod::Direct);
        assert_eq!(opts.svd_threshold, 1e-13);
        assert!(opts.calculate_error);
        assert!(opts.seed.is_none());
        assert!(opts.regularization.is_none());

        let comp = CompressionOptions::default();
        assert_eq!(comp.oversampling, 10);
        assert_eq!(comp.power_iterations, 2);
    }

    #[test]
    fn test_builder_chain() {
        let opts = AlsOptions::default()
            .with_fast_pseudoinverse(false)
            .with_svd_threshold(1e-10)
            .with_calculate_error(false)
            .with_regularization(RalsOptions::default());
        assert!(!opts.fast_pseudoinverse);
        assert_eq!(opts.svd_threshold, 1e-10);
        assert!(!opts.calculate_error);
        assert_eq!(opts.regularization.map(|r| r.initial_damping), Some(1.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let opts = AlsOptions::default().with_seed(11).with_max_sweeps(50);
        let json = serde_json::to_string(&opts).unwrap();
        let back: AlsOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(opts, back);
    }
}
