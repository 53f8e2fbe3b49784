//! Property-based tests for the CP engine pieces

use super::*;
use cpals_core::DenseND;
use proptest::prelude::*;
use scirs2_core::ndarray_ext::{Array1, Array2};

fn filled(rows: usize, cols: usize, salt: u64) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let h = (i as u64 * 2654435761 + j as u64 * 40503 + salt) % 1000;
        h as f64 / 500.0 - 1.0
    })
}

fn dense(shape: &[usize], salt: u64) -> DenseND<f64> {
    let mut k = 0u64;
    DenseND::from_fn(shape, |_| {
        k += 1;
        ((k * 7919 + salt) % 97) as f64 / 48.0 - 1.0
    })
}

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= 1e-9 * scale.max(1.0)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, ..Default::default() })]

    #[test]
    fn prop_normalize_keeps_reconstruction(
        shape in prop::collection::vec(1usize..5, 2..=4),
        rank in 1usize..4,
        mode_pick in 0usize..4,
        salt in 0u64..1000,
    ) {
        let factors: Vec<_> = shape
            .iter()
            .enumerate()
            .map(|(n, &rows)| filled(rows, rank, salt + n as u64))
            .collect();
        let weights = Array1::from_shape_fn(rank, |r| 1.0 + r as f64);
        let mut cp = CpDecomp::new(factors, weights).unwrap();
        let before = cp.reconstruct().unwrap();

        cp.normalize(mode_pick % shape.len()).unwrap();
        let after = cp.reconstruct().unwrap();
        let scale = before.frobenius_norm();
        for (x, y) in before.iter().zip(after.iter()) {
            prop_assert!(close(*x, *y, scale));
        }
    }

    #[test]
    fn prop_model_norm_matches_reconstruction(
        shape in prop::collection::vec(1usize..5, 2..=4),
        rank in 1usize..4,
        salt in 0u64..1000,
    ) {
        let factors: Vec<_> = shape
            .iter()
            .enumerate()
            .map(|(n, &rows)| filled(rows, rank, salt * 3 + n as u64))
            .collect();
        let cp = CpDecomp::with_unit_weights(factors).unwrap();
        let full = cp.reconstruct().unwrap().squared_norm();
        prop_assert!(close(cp.squared_norm(), full, full));
    }

    #[test]
    fn prop_pair_mttkrp_matches_materialized(
        connecting in 1usize..4,
        left_rest in prop::collection::vec(1usize..4, 1..=2),
        right_rest in prop::collection::vec(1usize..4, 1..=2),
        rank in 1usize..3,
        pick in 0usize..4,
        salt in 0u64..500,
    ) {
        let mut left_shape = vec![connecting];
        left_shape.extend(&left_rest);
        let mut right_shape = vec![connecting];
        right_shape.extend(&right_rest);
        let left = dense(&left_shape, salt);
        let right = dense(&right_shape, salt + 17);

        let mut pair = PairSource::new(&left, &right).unwrap();
        let full = pair.materialize().unwrap();
        let extents = pair.extents().to_vec();
        let mode = pick % extents.len();
        let factors: Vec<_> = extents
            .iter()
            .enumerate()
            .map(|(n, &rows)| filled(rows, rank, salt + 5 * n as u64))
            .collect();

        let implicit = pair.mttkrp(&factors, mode, ContractionMethod::Direct).unwrap();
        let explicit = DenseSource::new(&full)
            .mttkrp(&factors, mode, ContractionMethod::KhatriRao)
            .unwrap();
        let scale = explicit.iter().fold(0.0f64, |m, x| m.max(x.abs()));
        for (x, y) in implicit.iter().zip(explicit.iter()) {
            prop_assert!(close(*x, *y, scale));
        }
    }

    #[test]
    fn prop_first_sweep_independent_of_method(
        shape in prop::collection::vec(2usize..5, 3..=4),
        rank in 1usize..3,
        seed in 0u64..100,
    ) {
        let x = dense(&shape, seed);
        let mut results = Vec::new();
        for method in [ContractionMethod::Direct, ContractionMethod::KhatriRao] {
            let opts = AlsOptions::default()
                .with_seed(seed)
                .with_method(method)
                .with_max_sweeps(1)
                .with_fast_pseudoinverse(false);
            let mut cp = CpAls::new(&x).with_options(opts);
            cp.compute_rank_random(rank, &mut NormCheck::new(0.0)).unwrap();
            results.push(cp.reconstruct().unwrap());
        }
        let scale = results[0].frobenius_norm();
        for (a, b) in results[0].iter().zip(results[1].iter()) {
            prop_assert!((a - b).abs() <= 1e-7 * scale.max(1.0));
        }
    }
}
