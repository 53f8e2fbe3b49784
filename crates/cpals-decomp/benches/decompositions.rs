//! Benchmarks for the CP-ALS engines
//!
//! Fixed sweep counts so that runs are comparable across contraction
//! methods and inputs.
//!
//! Run with: cargo bench -p cpals-decomp

use cpals_core::DenseND;
use cpals_decomp::{AlsOptions, ContractionMethod, CpAls, NormCheck, TensorSource};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scirs2_core::random::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn uniform(shape: &[usize], seed: u64) -> DenseND<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    DenseND::from_fn(shape, |_| rng.random_range(0.0..1.0))
}

fn sweeps(n: usize, method: ContractionMethod) -> AlsOptions {
    AlsOptions::default()
        .with_seed(1)
        .with_max_sweeps(n)
        .with_method(method)
        .with_calculate_error(false)
}

fn bench_cp_als_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("cp_als_10_sweeps");
    group.sample_size(10);

    for &(size, rank) in &[(16, 4), (32, 8), (48, 16)] {
        let tensor = uniform(&[size, size, size], size as u64);
        group.throughput(Throughput::Elements((size * size * size) as u64));

        for (name, method) in [
            ("direct", ContractionMethod::Direct),
            ("khatri_rao", ContractionMethod::KhatriRao),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, format!("{}^3_r{}", size, rank)),
                &tensor,
                |b, tensor| {
                    b.iter(|| {
                        let mut cp = CpAls::new(tensor).with_options(sweeps(10, method));
                        let mut test = NormCheck::new(0.0);
                        black_box(cp.compute_rank_random(rank, &mut test).unwrap());
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_pair_vs_materialized(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_source");
    group.sample_size(10);

    for &size in &[8usize, 16] {
        let left = uniform(&[size, size, size], 3);
        let right = uniform(&[size, size, size], 4);
        let rank = 4;

        group.bench_with_input(BenchmarkId::new("implicit", size), &size, |b, _| {
            b.iter(|| {
                let mut cp = CpAls::from_pair(&left, &right)
                    .unwrap()
                    .with_options(sweeps(5, ContractionMethod::Direct));
                black_box(cp.compute_rank_random(rank, &mut NormCheck::new(0.0)).unwrap());
            })
        });

        let full = CpAls::from_pair(&left, &right)
            .unwrap()
            .source()
            .materialize()
            .unwrap();
        group.bench_with_input(BenchmarkId::new("materialized", size), &full, |b, full| {
            b.iter(|| {
                let mut cp = CpAls::new(full).with_options(sweeps(5, ContractionMethod::Direct));
                black_box(cp.compute_rank_random(rank, &mut NormCheck::new(0.0)).unwrap());
            })
        });
    }
    group.finish();
}

fn bench_pals(c: &mut Criterion) {
    let mut group = c.benchmark_group("pals");
    group.sample_size(10);

    let tensor = uniform(&[12, 12, 12], 7);
    group.bench_function("12^3_two_panels", |b| {
        b.iter(|| {
            let opts = AlsOptions::default().with_seed(2).with_max_sweeps(20);
            let mut cp = CpAls::new(&tensor).with_options(opts);
            let mut tests = [NormCheck::new(1e-6), NormCheck::new(1e-6)];
            black_box(cp.compute_pals(&mut tests, 0.5, 2).unwrap());
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_cp_als_methods,
    bench_pair_vs_materialized,
    bench_pals
);
criterion_main!(benches);
