//! Compression front-ends for the dense engine
//!
//! Both project X onto per-mode orthonormal bases Uₙ, decompose the small
//! core G = X ×₀ U₀ᵀ ⋯ ×_{N-1} U_{N-1}ᵀ, and map the core factors back with
//! Aₙ = Uₙ Bₙ. Column norms survive the mapping because every Uₙ has
//! orthonormal columns.
//!
//! - Tucker: Uₙ holds the eigenvectors of X₍ₙ₎X₍ₙ₎ᵀ whose eigenvalues exceed
//!   `tcut` times the largest one.
//! - Randomized: Uₙ is a randomized range basis of X₍ₙ₎.
//!
//! Aliased modes reuse the basis of the mode they alias, so the core keeps
//! the same symmetries.

use crate::convergence::ConvergenceTest;
use crate::cp::{AlsRun, CpAls};
use crate::decomp::CpDecomp;
use crate::error::CpResult;
use crate::options::CompressionOptions;
use crate::source::{DenseSource, TensorSource};
use cpals_core::linalg::symmetric_eigen;
use cpals_core::{DenseND, Scalar};
use cpals_kernels::{nmode_product, randomized_range_finder};
use scirs2_core::ndarray_ext::Array2;
use scirs2_core::random::{rngs::StdRng, SeedableRng};

impl<'a, T: Scalar> CpAls<T, DenseSource<'a, T>> {
    /// Tucker-compress, decompose the core at `rank`, and map back.
    ///
    /// The returned error, when computed, is the Frobenius residual against
    /// the original tensor.
    pub fn compress_compute_tucker<C: ConvergenceTest<T>>(
        &mut self,
        tcut: T,
        rank: usize,
        conv: &mut C,
    ) -> CpResult<Option<T>> {
        self.check_config(rank)?;
        if self.is_trivial()? {
            return Ok(Some(self.finish_empty()));
        }
        let bases = self.bases(|engine, mode| tucker_basis(engine.tensor(), mode, tcut))?;
        self.decompose_core(&bases, rank, conv)
    }

    /// Randomized-range compression to about `compressed_rank` columns per
    /// mode, then decompose the core at `rank` and map back.
    pub fn compress_compute_rand<C: ConvergenceTest<T>>(
        &mut self,
        compressed_rank: usize,
        rank: usize,
        conv: &mut C,
        compression: CompressionOptions,
    ) -> CpResult<Option<T>> {
        self.check_config(rank)?;
        self.check_config(compressed_rank)?;
        if self.is_trivial()? {
            return Ok(Some(self.finish_empty()));
        }
        let bases = self.bases(|engine, mode| {
            let tensor = engine.tensor();
            let unfolded = tensor.unfold(mode)?;
            Ok(randomized_range_finder(
                &unfolded.view(),
                compressed_rank,
                compression.oversampling,
                compression.power_iterations,
                engine.rng_mut(),
            )?)
        })?;
        self.decompose_core(&bases, rank, conv)
    }

    /// One basis per mode; aliased modes share the basis of their target.
    fn bases<F>(&mut self, mut basis_of: F) -> CpResult<Vec<Array2<T>>>
    where
        F: FnMut(&mut Self, usize) -> CpResult<Array2<T>>,
    {
        let symmetries = self.symmetries().to_vec();
        let mut bases: Vec<Array2<T>> = Vec::with_capacity(symmetries.len());
        for (mode, &target) in symmetries.iter().enumerate() {
            let basis = if target == mode {
                basis_of(self, mode)?
            } else {
                bases[target].clone()
            };
            bases.push(basis);
        }
        Ok(bases)
    }

    fn decompose_core<C: ConvergenceTest<T>>(
        &mut self,
        bases: &[Array2<T>],
        rank: usize,
        conv: &mut C,
    ) -> CpResult<Option<T>> {
        let mut core = self.tensor().as_array().clone();
        for (mode, basis) in bases.iter().enumerate() {
            core = nmode_product(&core.view(), &basis.t(), mode)?;
        }
        let core = DenseND::from_array(core);
        log::debug!(
            "compressed {:?} to core {:?}",
            self.tensor().shape(),
            core.shape()
        );

        let rng = StdRng::from_rng(self.rng_mut());
        let mut inner = CpAls::new(&core)
            .with_options(self.options().clone())
            .with_symmetries(self.symmetries().to_vec())?
            .with_rng(rng);
        inner.compute_rank_random(rank, conv)?;
        let inner_state = inner.state();
        let runs: Vec<AlsRun<T>> = inner.history().to_vec();
        let core_decomp = inner.into_decomp()?;

        let factors = bases
            .iter()
            .zip(&core_decomp.factors)
            .map(|(basis, factor)| basis.dot(factor))
            .collect();
        let decomp = CpDecomp::new(factors, core_decomp.weights)?;

        for run in runs {
            // core errors are not comparable with errors on the full tensor
            self.record_run(AlsRun { error: None, ..run });
        }
        self.replace_decomp(decomp);
        self.set_state(inner_state);

        if self.options().calculate_error {
            let approx = self.reconstruct()?;
            Ok(Some(self.source().residual_norm(&approx)?))
        } else {
            Ok(None)
        }
    }
}

/// Eigenvectors of X₍ₙ₎X₍ₙ₎ᵀ above the relative cutoff, largest first
fn tucker_basis<T: Scalar>(tensor: &DenseND<T>, mode: usize, tcut: T) -> CpResult<Array2<T>> {
    let unfolded = tensor.unfold(mode)?;
    let gram = unfolded.dot(&unfolded.t());
    let (values, vectors) = symmetric_eigen(&gram.view())?;
    let n = values.len();
    let largest = values
        .iter()
        .copied()
        .fold(T::zero(), |acc, v| if v > acc { v } else { acc });
    let cutoff = tcut * largest;
    let kept = values.iter().filter(|&&v| v > cutoff).count().max(1).min(n);

    let mut basis = Array2::<T>::zeros((n, kept));
    for k in 0..kept {
        basis.column_mut(k).assign(&vectors.column(n - 1 - k));
    }
    Ok(basis)
}
