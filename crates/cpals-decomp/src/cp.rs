//! CP-ALS engine
//!
//! One engine drives every strategy: plain ALS from a random guess, rank
//! growth by a fixed or geometric step, growth until a target error, and
//! panel growth from an SVD guess. The tensor is reached only through a
//! [`TensorSource`], so the same code runs over a dense tensor
//! ([`DenseSource`]) and over a contracted pair ([`PairSource`]).
//!
//! # Algorithm
//!
//! One sweep updates every mode n in turn:
//!
//! 1. aliased modes copy the factor they alias and move on,
//! 2. M = X₍ₙ₎ (⊙_{i≠n} Aᵢ), the MTTKRP, direct or through the Khatri-Rao
//!    matrix,
//! 3. solve Aₙ · G = M with G = ∘_{i≠n} AᵢᵀAᵢ, Cholesky first and the SVD
//!    pseudoinverse when G is not positive definite,
//! 4. normalize the columns of Aₙ, the norms becoming the weights.
//!
//! After each sweep the convergence policy sees the full factor set. A run
//! stops on convergence or after `max_sweeps` sweeps.
//!
//! # Examples
//!
//! ```
//! use cpals_core::DenseND;
//! use cpals_decomp::{AlsOptions, CpAls, NormCheck};
//!
//! let a = [1.0, 2.0, 3.0];
//! let b = [0.5, -1.0, 1.0, 2.0];
//! let c = [1.0, 1.0];
//! let x = DenseND::<f64>::from_fn(&[3, 4, 2], |i| a[i[0]] * b[i[1]] * c[i[2]]);
//!
//! let mut cp = CpAls::new(&x).with_options(AlsOptions::default().with_seed(3));
//! let mut test = NormCheck::new(1e-12);
//! let error = cp.compute_rank_random(1, &mut test)?.unwrap();
//! assert!(error < 1e-8);
//! assert_eq!(cp.rank(), 1);
//! # Ok::<(), cpals_decomp::CpError>(())
//! ```

use crate::convergence::ConvergenceTest;
use crate::decomp::{solve_normal_equations, CpDecomp, SolveStrategy};
use crate::df::PairSource;
use crate::error::{CpError, CpResult};
use crate::options::AlsOptions;
use crate::rals::{decay_damping, RalsHelper};
use crate::source::{DenseSource, TensorSource};
use cpals_core::linalg::symmetric_eigen;
use cpals_core::{DenseND, Scalar};
use scirs2_core::ndarray_ext::{s, Array1, Array2, Axis};
use scirs2_core::random::{rngs::StdRng, thread_rng, Rng, SeedableRng};

/// Where an engine is in its life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No factors yet
    Uninitialized,
    /// Factors hold an initial guess or were just grown
    InitialGuess,
    /// An ALS run is in progress
    Sweeping,
    /// The last run stopped on its convergence test
    Converged,
    /// The last run stopped on the sweep cap
    MaxIterHit,
}

/// Summary of one ALS run
#[derive(Debug, Clone, PartialEq)]
pub struct AlsRun<T> {
    pub rank: usize,
    pub sweeps: usize,
    pub converged: bool,
    pub error: Option<T>,
    /// Strategy of the last normal-equations solve of the run
    pub last_solve: Option<SolveStrategy>,
}

/// Regularization state of one ALS run: step helper plus per-mode damping
type RalsState<T> = (RalsHelper<T>, Vec<T>);

/// CP-ALS engine over a tensor source
pub struct CpAls<T, S> {
    source: S,
    options: AlsOptions,
    symmetries: Vec<usize>,
    decomp: Option<CpDecomp<T>>,
    rng: StdRng,
    state: EngineState,
    reference_norm: Option<T>,
    history: Vec<AlsRun<T>>,
    total_sweeps: usize,
}

impl<'a, T: Scalar> CpAls<T, DenseSource<'a, T>> {
    /// Engine over a dense tensor, borrowed for the engine lifetime
    pub fn new(tensor: &'a DenseND<T>) -> Self {
        Self::from_source(DenseSource::new(tensor))
    }

    /// The tensor being decomposed
    pub fn tensor(&self) -> &'a DenseND<T> {
        self.source.tensor()
    }
}

impl<'a, T: Scalar> CpAls<T, PairSource<'a, T>> {
    /// Engine over the contraction of `left` and `right` over their mode 0
    pub fn from_pair(left: &'a DenseND<T>, right: &'a DenseND<T>) -> CpResult<Self> {
        Ok(Self::from_source(PairSource::new(left, right)?))
    }
}

impl<T: Scalar, S: TensorSource<T>> CpAls<T, S> {
    pub fn from_source(source: S) -> Self {
        let options = AlsOptions::default();
        let symmetries = (0..source.order()).collect();
        Self {
            rng: make_rng(options.seed),
            source,
            options,
            symmetries,
            decomp: None,
            state: EngineState::Uninitialized,
            reference_norm: None,
            history: Vec::new(),
            total_sweeps: 0,
        }
    }

    /// Replace the options; reseeds the generator.
    pub fn with_options(mut self, options: AlsOptions) -> Self {
        self.rng = make_rng(options.seed);
        self.options = options;
        self
    }

    /// Declare modes whose factors are identical.
    ///
    /// `symmetries[i] == i` leaves mode i independent; `symmetries[i] = j`
    /// with `j < i` makes the factor of mode i a copy of the factor of mode
    /// j.
    ///
    /// # Errors
    ///
    /// [`CpError::SymmetryLength`] if the map does not have one entry per
    /// mode, [`CpError::InvalidSymmetry`] if an entry points forward or
    /// joins modes of different extent.
    pub fn with_symmetries(mut self, symmetries: Vec<usize>) -> CpResult<Self> {
        validate_symmetries(self.source.extents(), &symmetries)?;
        self.symmetries = symmetries;
        Ok(self)
    }

    pub fn options(&self) -> &AlsOptions {
        &self.options
    }

    pub fn symmetries(&self) -> &[usize] {
        &self.symmetries
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Current column count, 0 before any computation
    pub fn rank(&self) -> usize {
        self.decomp.as_ref().map_or(0, |d| d.rank())
    }

    /// Every ALS run so far, oldest first
    pub fn history(&self) -> &[AlsRun<T>] {
        &self.history
    }

    /// Sweeps over all runs
    pub fn total_sweeps(&self) -> usize {
        self.total_sweeps
    }

    pub fn decomposition(&self) -> Option<&CpDecomp<T>> {
        self.decomp.as_ref()
    }

    pub fn factors(&self) -> CpResult<&[Array2<T>]> {
        Ok(&self.computed()?.factors)
    }

    pub fn weights(&self) -> CpResult<&Array1<T>> {
        Ok(&self.computed()?.weights)
    }

    pub fn into_decomp(self) -> CpResult<CpDecomp<T>> {
        self.decomp.ok_or(CpError::NotComputed)
    }

    /// Dense reconstruction of the current factors
    pub fn reconstruct(&self) -> CpResult<DenseND<T>> {
        self.computed()?.reconstruct()
    }

    /// Seed the engine with existing factors; the next
    /// [`compute_rank`](Self::compute_rank) continues from them.
    pub fn set_factors(&mut self, decomp: CpDecomp<T>) -> CpResult<()> {
        if decomp.shape() != self.source.extents() {
            return Err(CpError::InvalidOrder(format!(
                "factor rows {:?} do not match extents {:?}",
                decomp.shape(),
                self.source.extents()
            )));
        }
        self.decomp = Some(decomp);
        self.state = EngineState::InitialGuess;
        self.source.invalidate_cache();
        Ok(())
    }

    /// Solve `X · G = candidate` for the factor of `mode`, G being the
    /// Hadamard product of the Gram matrices of every other factor.
    ///
    /// Returns the strategy that produced the solution.
    pub fn pseudoinverse_solve(
        &self,
        mode: usize,
        candidate: &Array2<T>,
    ) -> CpResult<(Array2<T>, SolveStrategy)> {
        let gram = self.computed()?.gram_hadamard_except(mode)?;
        solve_normal_equations(
            &gram.view(),
            &candidate.view(),
            self.options.fast_pseudoinverse,
            T::cast(self.options.svd_threshold),
        )
    }

    /// Khatri-Rao product of every current factor but `mode`
    pub fn khatri_rao_except(&self, mode: usize) -> CpResult<Array2<T>> {
        self.computed()?.khatri_rao_except(mode)
    }

    /// Append `new_rank - rank` random unit columns to every factor.
    ///
    /// Existing columns are kept. New components get unit weight.
    pub fn grow_rank(&mut self, new_rank: usize) -> CpResult<()> {
        let decomp = self.decomp.as_mut().ok_or(CpError::NotComputed)?;
        let current = decomp.rank();
        if new_rank < current {
            return Err(CpError::RankShrink {
                current,
                requested: new_rank,
            });
        }
        if new_rank == current {
            return Ok(());
        }

        for (mode, factor) in decomp.factors.iter_mut().enumerate() {
            if self.symmetries[mode] != mode {
                continue;
            }
            let rows = factor.nrows();
            let mut grown = Array2::<T>::zeros((rows, new_rank));
            grown.slice_mut(s![.., ..current]).assign(&*factor);
            let pad = random_unit_columns(&mut self.rng, rows, new_rank - current);
            grown.slice_mut(s![.., current..]).assign(&pad);
            *factor = grown;
        }
        let mut weights = Array1::<T>::ones(new_rank);
        weights
            .slice_mut(s![..current])
            .assign(&decomp.weights);
        decomp.weights = weights;
        sync_aliases(decomp, &self.symmetries);

        self.state = EngineState::InitialGuess;
        self.source.invalidate_cache();
        Ok(())
    }

    /// Decompose at `rank`, growing the column count by `step` and running
    /// ALS at every stage.
    ///
    /// Starts from one random stage of `min(step, rank)` columns, or
    /// continues from the current factors when there are any.
    pub fn compute_rank<C: ConvergenceTest<T>>(
        &mut self,
        rank: usize,
        conv: &mut C,
        step: usize,
    ) -> CpResult<Option<T>> {
        self.build(rank, conv, step, None)
    }

    /// Like [`compute_rank`](Self::compute_rank), starting from the SVD
    /// guess at `svd_rank` columns when there are no factors yet.
    pub fn compute_rank_svd<C: ConvergenceTest<T>>(
        &mut self,
        rank: usize,
        svd_rank: usize,
        conv: &mut C,
        step: usize,
    ) -> CpResult<Option<T>> {
        if svd_rank == 0 {
            return Err(CpError::InvalidRank(0));
        }
        self.build(rank, conv, step, Some(svd_rank))
    }

    /// Fresh random guess at `rank` columns, then one ALS run.
    pub fn compute_rank_random<C: ConvergenceTest<T>>(
        &mut self,
        rank: usize,
        conv: &mut C,
    ) -> CpResult<Option<T>> {
        self.check_config(rank)?;
        if self.is_trivial()? {
            return Ok(Some(self.finish_empty()));
        }
        self.init_random(rank);
        self.als(conv, false)
    }

    /// Grow the rank one column at a time until the error drops below
    /// `omega` or the rank reaches `max_rank`.
    ///
    /// The error is always computed here, whatever `calculate_error` says.
    pub fn compute_error<C: ConvergenceTest<T>>(
        &mut self,
        omega: T,
        max_rank: usize,
        conv: &mut C,
    ) -> CpResult<T> {
        self.check_config(max_rank)?;
        if self.is_trivial()? {
            return Ok(self.finish_empty());
        }
        if self.decomp.is_none() {
            self.init_random(1);
        }
        let mut error = self.als(conv, true)?.unwrap_or_else(T::infinity);
        while error > omega && self.rank() < max_rank {
            let next = self.rank() + 1;
            self.grow_rank(next)?;
            error = self.als(conv, true)?.unwrap_or_else(T::infinity);
        }
        log::debug!(
            "error-driven growth stopped at rank {} with error {}",
            self.rank(),
            error
        );
        Ok(error)
    }

    /// Grow the rank geometrically, 1, step, step², ..., capped at `rank`,
    /// with an ALS run at each stage.
    pub fn compute_geometric<C: ConvergenceTest<T>>(
        &mut self,
        rank: usize,
        conv: &mut C,
        step: usize,
    ) -> CpResult<Option<T>> {
        self.check_config(rank)?;
        if step < 2 {
            return Err(CpError::InvalidStep(step));
        }
        if self.is_trivial()? {
            return Ok(Some(self.finish_empty()));
        }
        self.init_random(1);
        let mut error = self.als(conv, false)?;
        while self.rank() < rank {
            let next = (self.rank() * step).min(rank);
            self.grow_rank(next)?;
            error = self.als(conv, false)?;
        }
        Ok(error)
    }

    /// Panel growth.
    ///
    /// Panel 0 starts from the SVD guess at rank = the largest extent and
    /// runs ALS with `tests[0]`. Every later panel p adds
    /// `floor(rank_step · largest extent)` random columns and runs ALS with
    /// `tests[p]`. Any existing factors are discarded first.
    pub fn compute_pals<C: ConvergenceTest<T>>(
        &mut self,
        tests: &mut [C],
        rank_step: f64,
        panels: usize,
    ) -> CpResult<Option<T>> {
        // NaN and infinity must fail here too
        if !(rank_step > 0.0 && rank_step.is_finite()) {
            return Err(CpError::InvalidPanelStep(rank_step));
        }
        if panels == 0 {
            return Err(CpError::InvalidStep(0));
        }
        if tests.len() < panels {
            return Err(CpError::TooFewConvergenceTests {
                panels,
                tests: tests.len(),
            });
        }
        let max_extent = self.source.extents().iter().copied().max().unwrap_or(0);
        self.check_config(max_extent.max(1))?;
        let panel_step = (rank_step * max_extent as f64).floor() as usize;
        let final_rank = panel_step
            .checked_mul(panels - 1)
            .and_then(|grown| grown.checked_add(max_extent))
            .ok_or(CpError::InvalidPanelStep(rank_step))?;
        if self.is_trivial()? {
            return Ok(Some(self.finish_empty()));
        }
        log::debug!("{} panels up to rank {}", panels, final_rank);

        self.decomp = None;
        self.svd_guess(max_extent)?;
        let mut error = self.als(&mut tests[0], false)?;
        log::debug!("panel 0 done at rank {}", self.rank());

        for (panel, test) in tests.iter_mut().enumerate().take(panels).skip(1) {
            let next = self.rank() + panel_step;
            self.grow_rank(next)?;
            error = self.als(test, false)?;
            log::debug!("panel {} done at rank {}", panel, self.rank());
        }
        Ok(error)
    }

    fn build<C: ConvergenceTest<T>>(
        &mut self,
        rank: usize,
        conv: &mut C,
        step: usize,
        svd_rank: Option<usize>,
    ) -> CpResult<Option<T>> {
        self.check_config(rank)?;
        if step == 0 {
            return Err(CpError::InvalidStep(0));
        }
        if self.is_trivial()? {
            return Ok(Some(self.finish_empty()));
        }

        let mut error = None;
        let mut ran = false;
        if self.decomp.is_none() {
            match svd_rank {
                Some(r) => self.svd_guess(r)?,
                None => self.init_random(step.min(rank)),
            }
            error = self.als(conv, false)?;
            ran = true;
        }

        while self.rank() < rank {
            let next = (self.rank() + step).min(rank);
            log::debug!("growing rank {} -> {}", self.rank(), next);
            self.grow_rank(next)?;
            error = self.als(conv, false)?;
            ran = true;
        }

        if !ran {
            error = self.als(conv, false)?;
        }
        Ok(error)
    }

    fn computed(&self) -> CpResult<&CpDecomp<T>> {
        self.decomp.as_ref().ok_or(CpError::NotComputed)
    }

    pub(crate) fn check_config(&self, rank: usize) -> CpResult<()> {
        if self.source.order() == 0 {
            return Err(CpError::InvalidOrder("tensor has no modes".to_string()));
        }
        if rank == 0 {
            return Err(CpError::InvalidRank(rank));
        }
        if self.options.max_sweeps == 0 {
            return Err(CpError::InvalidIterationCap);
        }
        Ok(())
    }

    /// Nothing to fit: the reference has no elements or is all zeros
    pub(crate) fn is_trivial(&mut self) -> CpResult<bool> {
        Ok(self.source.is_empty() || self.reference_norm()? == T::zero())
    }

    /// Zero-column factors and a zero error for a reference that is empty
    /// or identically zero
    pub(crate) fn finish_empty(&mut self) -> T {
        let factors = self
            .source
            .extents()
            .iter()
            .map(|&n| Array2::zeros((n, 0)))
            .collect();
        self.decomp = Some(CpDecomp {
            factors,
            weights: Array1::zeros(0),
        });
        self.state = EngineState::Converged;
        self.history.push(AlsRun {
            rank: 0,
            sweeps: 0,
            converged: true,
            error: Some(T::zero()),
            last_solve: None,
        });
        log::debug!("reference tensor is zero, nothing to decompose");
        T::zero()
    }

    /// Random unit columns, uniform on [-1, 1) before normalization
    fn init_random(&mut self, rank: usize) {
        let factors = self
            .source
            .extents()
            .iter()
            .map(|&n| random_unit_columns(&mut self.rng, n, rank))
            .collect();
        let mut decomp = CpDecomp {
            factors,
            weights: Array1::ones(rank),
        };
        sync_aliases(&mut decomp, &self.symmetries);
        self.decomp = Some(decomp);
        self.state = EngineState::InitialGuess;
    }

    /// Leading eigenvectors of X₍ₙ₎X₍ₙ₎ᵀ for every independent mode,
    /// padded with random unit columns when the extent is below `rank`
    fn svd_guess(&mut self, rank: usize) -> CpResult<()> {
        let order = self.source.order();
        let mut factors = Vec::with_capacity(order);
        for mode in 0..order {
            let rows = self.source.extents()[mode];
            if self.symmetries[mode] != mode {
                factors.push(Array2::zeros((rows, rank)));
                continue;
            }
            let gram = self.source.mode_gram(mode)?;
            let (_, vectors) = symmetric_eigen(&gram.view())?;
            let keep = rank.min(rows);
            let mut factor = random_unit_columns(&mut self.rng, rows, rank);
            for k in 0..keep {
                // eigenvalues come back ascending
                factor.column_mut(k).assign(&vectors.column(rows - 1 - k));
            }
            factors.push(factor);
        }
        let mut decomp = CpDecomp {
            factors,
            weights: Array1::ones(rank),
        };
        sync_aliases(&mut decomp, &self.symmetries);
        log::debug!("SVD initial guess at rank {}", rank);
        self.decomp = Some(decomp);
        self.state = EngineState::InitialGuess;
        Ok(())
    }

    fn reference_norm(&mut self) -> CpResult<T> {
        if let Some(norm) = self.reference_norm {
            return Ok(norm);
        }
        let norm = self.source.squared_norm()?.sqrt();
        self.reference_norm = Some(norm);
        Ok(norm)
    }

    /// One ALS run at the current rank
    fn als<C: ConvergenceTest<T>>(&mut self, conv: &mut C, force_error: bool) -> CpResult<Option<T>> {
        self.source.invalidate_cache();
        let norm = self.reference_norm()?;
        conv.reset();
        conv.set_reference_norm(norm);

        let threshold = T::cast(self.options.svd_threshold);
        let mut rals: Option<RalsState<T>> = match (self.options.regularization, &self.decomp) {
            (Some(opts), Some(decomp)) => Some((
                RalsHelper::new(decomp.factors.clone()),
                vec![T::cast(opts.initial_damping); decomp.order()],
            )),
            _ => None,
        };

        self.state = EngineState::Sweeping;
        let mut sweeps = 0;
        let mut converged = false;
        let mut last_solve = None;
        while sweeps < self.options.max_sweeps && !converged {
            sweeps += 1;
            if let Some(strategy) = self.sweep(conv, &mut rals, threshold)? {
                last_solve = Some(strategy);
            }
            converged = conv.is_converged(self.computed()?);
            log::trace!("sweep {} at rank {}", sweeps, self.rank());
        }
        self.total_sweeps += sweeps;

        if converged {
            self.state = EngineState::Converged;
            log::debug!("ALS at rank {} converged after {} sweeps", self.rank(), sweeps);
        } else {
            self.state = EngineState::MaxIterHit;
            log::warn!(
                "ALS at rank {} hit the sweep cap ({}) without converging",
                self.rank(),
                self.options.max_sweeps
            );
        }

        let error = if self.options.calculate_error || force_error {
            Some(self.current_error(conv)?)
        } else {
            None
        };
        self.history.push(AlsRun {
            rank: self.rank(),
            sweeps,
            converged,
            error,
            last_solve,
        });
        Ok(error)
    }

    fn sweep<C: ConvergenceTest<T>>(
        &mut self,
        conv: &mut C,
        rals: &mut Option<RalsState<T>>,
        threshold: T,
    ) -> CpResult<Option<SolveStrategy>> {
        let decomp = self.decomp.as_mut().ok_or(CpError::NotComputed)?;
        let mut last = None;

        for mode in 0..decomp.order() {
            let target = self.symmetries[mode];
            if target != mode {
                decomp.factors[mode] = decomp.factors[target].clone();
                continue;
            }

            let mut rhs = self
                .source
                .mttkrp(&decomp.factors, mode, self.options.method)?;
            conv.record_mttkrp(mode, &rhs);
            let mut gram = decomp.gram_hadamard_except(mode)?;

            if let Some((helper, damping)) = rals.as_ref() {
                let lambda = damping[mode];
                gram.diag_mut().mapv_inplace(|g| g + lambda);
                if let Some(prev) = helper.previous(mode) {
                    if prev.shape() == rhs.shape() {
                        rhs.scaled_add(lambda, prev);
                    }
                }
            }

            let (updated, strategy) = solve_normal_equations(
                &gram.view(),
                &rhs.view(),
                self.options.fast_pseudoinverse,
                threshold,
            )?;
            decomp.factors[mode] = updated;
            decomp.extract_weights(mode)?;

            if let Some((helper, damping)) = rals.as_mut() {
                let step = helper.step(mode, &decomp.factors[mode]);
                damping[mode] = decay_damping(damping[mode], step);
            }
            last = Some(strategy);
        }
        Ok(last)
    }

    /// `1 − fit` when the policy tracks the fit, otherwise the Frobenius
    /// residual against the reference tensor
    fn current_error<C: ConvergenceTest<T>>(&self, conv: &C) -> CpResult<T> {
        if let Some(fit) = conv.fit() {
            return Ok(T::one() - fit);
        }
        let approx = self.computed()?.reconstruct()?;
        self.source.residual_norm(&approx)
    }

    pub(crate) fn replace_decomp(&mut self, decomp: CpDecomp<T>) {
        self.decomp = Some(decomp);
    }

    pub(crate) fn record_run(&mut self, run: AlsRun<T>) {
        self.total_sweeps += run.sweeps;
        self.history.push(run);
    }

    pub(crate) fn set_state(&mut self, state: EngineState) {
        self.state = state;
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => {
            let mut thread_rng_instance = thread_rng();
            StdRng::from_rng(&mut thread_rng_instance)
        }
    }
}

/// Uniform [-1, 1) matrix with unit-norm columns
fn random_unit_columns<T: Scalar>(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<T> {
    let mut m = Array2::from_shape_fn((rows, cols), |_| {
        let v: f64 = rng.random_range(-1.0..1.0);
        T::cast(v)
    });
    for mut column in m.axis_iter_mut(Axis(1)) {
        let norm = column.iter().map(|&x| x * x).sum::<T>().sqrt();
        if norm > T::zero() {
            column.mapv_inplace(|x| x / norm);
        }
    }
    m
}

fn sync_aliases<T: Scalar>(decomp: &mut CpDecomp<T>, symmetries: &[usize]) {
    for (mode, &target) in symmetries.iter().enumerate() {
        if target != mode {
            decomp.factors[mode] = decomp.factors[target].clone();
        }
    }
}

pub(crate) fn validate_symmetries(extents: &[usize], symmetries: &[usize]) -> CpResult<()> {
    if symmetries.len() != extents.len() {
        return Err(CpError::SymmetryLength {
            expected: extents.len(),
            actual: symmetries.len(),
        });
    }
    for (mode, &target) in symmetries.iter().enumerate() {
        if target > mode {
            return Err(CpError::InvalidSymmetry {
                mode,
                target,
                reason: "a mode may only alias itself or an earlier mode",
            });
        }
        if extents[target] != extents[mode] {
            return Err(CpError::InvalidSymmetry {
                mode,
                target,
                reason: "aliased modes must have the same extent",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::{FitCheck, NormCheck};
    use crate::options::{ContractionMethod, RalsOptions};

    fn rank_one(a: &[f64], b: &[f64], c: &[f64]) -> DenseND<f64> {
        DenseND::from_fn(&[a.len(), b.len(), c.len()], |i| a[i[0]] * b[i[1]] * c[i[2]])
    }

    fn seeded(seed: u64) -> AlsOptions {
        AlsOptions::default().with_seed(seed).with_max_sweeps(500)
    }

    #[test]
    fn test_configuration_errors() {
        let x = DenseND::<f64>::ones(&[2, 3, 2]);
        let mut test = NormCheck::new(1e-8);

        let mut cp = CpAls::new(&x);
        assert_eq!(cp.compute_rank(0, &mut test, 1), Err(CpError::InvalidRank(0)));
        assert_eq!(cp.compute_rank(2, &mut test, 0), Err(CpError::InvalidStep(0)));
        assert_eq!(cp.compute_geometric(4, &mut test, 1), Err(CpError::InvalidStep(1)));

        let mut capped = CpAls::new(&x).with_options(AlsOptions::default().with_max_sweeps(0));
        assert_eq!(
            capped.compute_rank_random(1, &mut test),
            Err(CpError::InvalidIterationCap)
        );
        assert_eq!(cp.state(), EngineState::Uninitialized);
        assert!(cp.history().is_empty());
    }

    #[test]
    fn test_symmetry_validation() {
        let x = DenseND::<f64>::ones(&[3, 3, 2]);
        assert!(matches!(
            CpAls::new(&x).with_symmetries(vec![0, 0]),
            Err(CpError::SymmetryLength { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            CpAls::new(&x).with_symmetries(vec![1, 1, 2]),
            Err(CpError::InvalidSymmetry { mode: 0, target: 1, .. })
        ));
        assert!(matches!(
            CpAls::new(&x).with_symmetries(vec![0, 0, 0]),
            Err(CpError::InvalidSymmetry { mode: 2, target: 0, .. })
        ));
        assert!(CpAls::new(&x).with_symmetries(vec![0, 0, 2]).is_ok());
    }

    #[test]
    fn test_rank_one_recovery() {
        let a = [1.0, 2.0, -1.0, 0.5];
        let b = [0.3, 1.0, 2.0, -0.7, 1.5];
        let c = [2.0, 1.0, 0.0, 1.0, -1.0, 0.5];
        let x = rank_one(&a, &b, &c);

        let mut cp = CpAls::new(&x).with_options(seeded(1));
        let mut test = NormCheck::new(1e-12);
        let error = cp.compute_rank(1, &mut test, 1).unwrap().unwrap();
        assert!(error < 1e-8, "residual {}", error);
        assert_eq!(cp.state(), EngineState::Converged);

        let norm = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>().sqrt();
        let lambda = cp.weights().unwrap()[0];
        assert!((lambda - norm(&a) * norm(&b) * norm(&c)).abs() < 1e-8);

        // each factor is the original vector up to sign
        for (factor, v) in cp.factors().unwrap().iter().zip([&a[..], &b[..], &c[..]]) {
            let cos: f64 = factor.column(0).iter().zip(v).map(|(x, y)| x * y).sum::<f64>() / norm(v);
            assert!((cos.abs() - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_symmetric_modes_stay_identical() {
        let u = [1.0, -0.5, 2.0];
        let c = [1.0, 3.0];
        let x = rank_one(&u, &u, &c);
        let mut cp = CpAls::new(&x)
            .with_options(seeded(5).with_max_sweeps(50))
            .with_symmetries(vec![0, 0, 2])
            .unwrap();
        cp.compute_rank_random(2, &mut NormCheck::new(1e-10)).unwrap();
        let factors = cp.factors().unwrap();
        assert_eq!(factors[0], factors[1]);
    }

    #[test]
    fn test_grow_rank_keeps_columns() {
        let x = DenseND::<f64>::from_fn(&[3, 4, 2], |i| (i[0] + i[1] * i[2]) as f64);
        let mut cp = CpAls::new(&x).with_options(seeded(2).with_max_sweeps(20));
        cp.compute_rank_random(2, &mut NormCheck::new(1e-6)).unwrap();
        let before = cp.decomposition().unwrap().clone();

        cp.grow_rank(4).unwrap();
        let after = cp.decomposition().unwrap();
        assert_eq!(after.rank(), 4);
        for (old, new) in before.factors.iter().zip(&after.factors) {
            assert_eq!(new.slice(s![.., ..2]), old.view());
            for column in new.slice(s![.., 2..]).axis_iter(Axis(1)) {
                let norm: f64 = column.iter().map(|x| x * x).sum::<f64>().sqrt();
                assert!((norm - 1.0).abs() < 1e-12);
            }
        }
        assert_eq!(after.weights.slice(s![..2]), before.weights.view());
        assert_eq!(
            cp.grow_rank(3),
            Err(CpError::RankShrink { current: 4, requested: 3 })
        );
    }

    #[test]
    fn test_zero_element_tensor() {
        let x = DenseND::<f64>::zeros(&[3, 0, 2]);
        let mut cp = CpAls::new(&x);
        let error = cp.compute_rank(5, &mut NormCheck::new(1e-6), 1).unwrap();
        assert_eq!(error, Some(0.0));
        assert_eq!(cp.rank(), 0);
        assert_eq!(cp.total_sweeps(), 0);
        let shapes: Vec<_> = cp.factors().unwrap().iter().map(|f| f.dim()).collect();
        assert_eq!(shapes, vec![(3, 0), (0, 0), (2, 0)]);
    }

    #[test]
    fn test_methods_agree_on_one_sweep() {
        let x = DenseND::<f64>::from_fn(&[3, 4, 2, 3], |i| {
            ((i[0] * 7 + i[1] * 3 + i[2] * 5 + i[3]) % 11) as f64 - 5.0
        });
        let mut runs = Vec::new();
        for method in [ContractionMethod::Direct, ContractionMethod::KhatriRao] {
            let opts = seeded(9).with_method(method).with_max_sweeps(1);
            let mut cp = CpAls::new(&x).with_options(opts);
            cp.compute_rank_random(2, &mut NormCheck::new(0.0)).unwrap();
            runs.push(cp.into_decomp().unwrap());
        }
        for (a, b) in runs[0].factors.iter().zip(&runs[1].factors) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() < 1e-8);
            }
        }
        assert_eq!(runs[0].weights.len(), 2);
    }

    #[test]
    fn test_fit_check_reports_relative_error() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, -1.0, 0.5];
        let x = rank_one(&a, &b, &a);
        let mut cp = CpAls::new(&x).with_options(seeded(4));
        let mut test = FitCheck::new(1e-10);
        let error = cp.compute_rank_random(1, &mut test).unwrap().unwrap();
        assert!(error.abs() < 1e-6);
        assert!(test.fit().unwrap() > 1.0 - 1e-6);
    }

    #[test]
    fn test_regularized_run_still_fits() {
        let a = [1.0, 0.5, -1.0];
        let b = [2.0, 1.0, 1.0, 0.5];
        let c = [1.0, -2.0];
        let x = rank_one(&a, &b, &c);
        let opts = seeded(8).with_regularization(RalsOptions::default());
        let mut cp = CpAls::new(&x).with_options(opts);
        let error = cp
            .compute_rank_random(1, &mut NormCheck::new(1e-12))
            .unwrap()
            .unwrap();
        assert!(error < 1e-6, "residual {}", error);
    }

    #[test]
    fn test_pseudoinverse_solve_strategy() {
        let x = DenseND::<f64>::from_fn(&[2, 2, 2], |i| (i[0] + 2 * i[1] + 3 * i[2]) as f64);
        let mut cp = CpAls::new(&x).with_options(seeded(1).with_max_sweeps(3));
        cp.compute_rank_random(1, &mut NormCheck::new(1e-6)).unwrap();

        let candidate = Array2::from_elem((2, 1), 2.0);
        let (solution, strategy) = cp.pseudoinverse_solve(0, &candidate).unwrap();
        assert_eq!(strategy, SolveStrategy::Cholesky);
        // unit columns elsewhere make G = [[1]]
        assert!((solution[[0, 0]] - 2.0).abs() < 1e-12);

        let slow = CpAls::new(&x).with_options(seeded(1).with_fast_pseudoinverse(false));
        assert_eq!(
            slow.pseudoinverse_solve(0, &candidate).unwrap_err(),
            CpError::NotComputed
        );
    }

    #[test]
    fn test_pals_configuration() {
        let x = DenseND::<f64>::ones(&[2, 3]);
        let mut cp = CpAls::new(&x);
        let mut tests = vec![NormCheck::new(1e-6)];
        assert_eq!(
            cp.compute_pals(&mut tests, 0.5, 2),
            Err(CpError::TooFewConvergenceTests { panels: 2, tests: 1 })
        );
        assert_eq!(
            cp.compute_pals(&mut tests, 0.0, 1),
            Err(CpError::InvalidPanelStep(0.0))
        );

        let mut two = vec![NormCheck::new(1e-6), NormCheck::new(1e-6)];
        assert_eq!(
            cp.compute_pals(&mut two, f64::INFINITY, 2),
            Err(CpError::InvalidPanelStep(f64::INFINITY))
        );
        // finite, but the panel ranks do not fit in usize
        assert_eq!(
            cp.compute_pals(&mut two, 1e300, 2),
            Err(CpError::InvalidPanelStep(1e300))
        );
        assert!(matches!(
            cp.compute_pals(&mut two, f64::NAN, 2),
            Err(CpError::InvalidPanelStep(_))
        ));
        assert_eq!(cp.total_sweeps(), 0);
        assert_eq!(cp.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_all_zero_tensor_short_circuits() {
        let x = DenseND::<f64>::zeros(&[3, 2, 4]);
        let mut cp = CpAls::new(&x).with_options(seeded(1).with_max_sweeps(50));
        let error = cp.compute_rank(2, &mut NormCheck::new(1e-8), 1).unwrap();
        assert_eq!(error, Some(0.0));
        assert_eq!(cp.total_sweeps(), 0);
        assert_eq!(cp.state(), EngineState::Converged);
        assert_eq!(cp.weights().unwrap().len(), 0);
        assert!(cp.factors().unwrap().iter().all(|f| f.ncols() == 0));
    }
}
