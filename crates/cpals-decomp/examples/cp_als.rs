//! CP-ALS Example
//!
//! Decomposes a synthetic low-rank tensor with each rank strategy and
//! prints the residuals.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example cp_als
//! ```

use cpals_core::DenseND;
use cpals_decomp::{AlsOptions, CompressionOptions, ConvergenceTest, CpAls, FitCheck, NormCheck};
use scirs2_core::random::{rngs::StdRng, Rng, SeedableRng};

/// Sum of `rank` random rank-1 terms plus a little noise
fn synthetic(shape: &[usize], rank: usize, noise: f64, seed: u64) -> DenseND<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let factors: Vec<Vec<f64>> = shape
        .iter()
        .map(|&n| (0..n * rank).map(|_| rng.random_range(-1.0..1.0)).collect())
        .collect();
    DenseND::from_fn(shape, |idx| {
        let clean: f64 = (0..rank)
            .map(|r| {
                idx.iter()
                    .zip(&factors)
                    .map(|(&i, f)| f[i * rank + r])
                    .product::<f64>()
            })
            .sum();
        clean + noise * rng.random_range(-1.0..1.0)
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("{}", "=".repeat(80));
    println!("CP-ALS Decomposition Example");
    println!("{}", "=".repeat(80));
    println!();

    let shape = [20, 15, 10];
    let tensor = synthetic(&shape, 4, 1e-3, 42);
    let norm = tensor.frobenius_norm();
    let options = AlsOptions::default().with_seed(7).with_max_sweeps(500);
    println!("Tensor shape: {:?}, norm {:.4}", shape, norm);
    println!();

    // ========================================================================
    // Example 1: rank growth by one column per stage
    // ========================================================================
    println!("Example 1: compute_rank");
    println!("{}", "-".repeat(80));
    let mut cp = CpAls::new(&tensor).with_options(options.clone());
    let error = cp.compute_rank(4, &mut NormCheck::new(1e-8), 1)?;
    for run in cp.history() {
        println!(
            "  rank {:>2}: {:>4} sweeps, converged={}, error={:?}",
            run.rank, run.sweeps, run.converged, run.error
        );
    }
    println!("  final relative error: {:.3e}", error.unwrap_or(f64::NAN) / norm);
    println!();

    // ========================================================================
    // Example 2: fit-based convergence
    // ========================================================================
    println!("Example 2: FitCheck");
    println!("{}", "-".repeat(80));
    let mut cp = CpAls::new(&tensor).with_options(options.clone());
    let mut fit = FitCheck::new(1e-9);
    cp.compute_rank_random(4, &mut fit)?;
    println!("  fit {:.6} after {} sweeps", fit.fit().unwrap_or(f64::NAN), cp.total_sweeps());
    println!();

    // ========================================================================
    // Example 3: error-driven rank selection
    // ========================================================================
    println!("Example 3: compute_error");
    println!("{}", "-".repeat(80));
    let mut cp = CpAls::new(&tensor).with_options(options.clone());
    let error = cp.compute_error(0.05 * norm, 8, &mut NormCheck::new(1e-8))?;
    println!("  reached rank {} with error {:.4e}", cp.rank(), error);
    println!();

    // ========================================================================
    // Example 4: panel growth from an SVD guess
    // ========================================================================
    println!("Example 4: compute_pals");
    println!("{}", "-".repeat(80));
    let mut cp = CpAls::new(&tensor).with_options(options.clone());
    let mut tests = [NormCheck::new(1e-6), NormCheck::new(1e-6)];
    cp.compute_pals(&mut tests, 0.25, 2)?;
    for (panel, run) in cp.history().iter().enumerate() {
        println!("  panel {}: rank {}, error {:?}", panel, run.rank, run.error);
    }
    println!();

    // ========================================================================
    // Example 5: compression front-ends
    // ========================================================================
    println!("Example 5: compressed decompositions");
    println!("{}", "-".repeat(80));
    let mut cp = CpAls::new(&tensor).with_options(options.clone());
    let tucker = cp.compress_compute_tucker(1e-6, 4, &mut NormCheck::new(1e-8))?;
    println!("  tucker:     error {:?}", tucker);

    let mut cp = CpAls::new(&tensor).with_options(options.clone());
    let rand = cp.compress_compute_rand(4, 4, &mut NormCheck::new(1e-8), CompressionOptions::default())?;
    println!("  randomized: error {:?}", rand);
    println!();

    // ========================================================================
    // Example 6: contraction of two tensors, never formed
    // ========================================================================
    println!("Example 6: two-tensor input");
    println!("{}", "-".repeat(80));
    let left = synthetic(&[6, 12], 2, 0.0, 1);
    let right = synthetic(&[6, 9, 8], 2, 0.0, 2);
    let mut cp = CpAls::from_pair(&left, &right)?.with_options(options);
    let error = cp.compute_rank(3, &mut NormCheck::new(1e-8), 1)?;
    println!("  implicit shape {:?}", cp.factors()?.iter().map(|f| f.nrows()).collect::<Vec<_>>());
    println!("  error {:?}", error);

    Ok(())
}
