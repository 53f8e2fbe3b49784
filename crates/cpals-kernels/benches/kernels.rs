//! Benchmarks for the CP-ALS kernels
//!
//! Run with: cargo bench -p cpals-kernels

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scirs2_core::ndarray_ext::{Array, Array2, IxDyn};
use cpals_kernels::*;

fn cube(size: usize) -> Array<f64, IxDyn> {
    let n = size * size * size;
    Array::from_shape_vec(
        IxDyn(&[size, size, size]),
        (0..n).map(|k| (k % 17) as f64 * 0.1).collect(),
    )
    .unwrap()
}

fn bench_khatri_rao(c: &mut Criterion) {
    let mut group = c.benchmark_group("khatri_rao");

    for &size in [10, 50, 100].iter() {
        let rank = 16;
        let a = Array2::<f64>::from_shape_fn((size, rank), |(i, j)| (i + j) as f64);
        let b = Array2::<f64>::from_shape_fn((size, rank), |(i, j)| (i * j + 1) as f64);
        group.throughput(Throughput::Elements((size * size * rank) as u64));

        group.bench_with_input(
            BenchmarkId::new("serial", format!("{}x{}", size, rank)),
            &size,
            |bencher, _| {
                bencher.iter(|| black_box(khatri_rao(&a.view(), &b.view()).unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_mttkrp(c: &mut Criterion) {
    let mut group = c.benchmark_group("mttkrp");

    for &size in [10, 20, 40].iter() {
        let rank = 8;
        let tensor = cube(size);
        let factors: Vec<Array2<f64>> = (0..3)
            .map(|k| Array2::from_shape_fn((size, rank), |(i, j)| ((i + j + k) % 5) as f64))
            .collect();
        let views: Vec<_> = factors.iter().map(|f| f.view()).collect();
        group.throughput(Throughput::Elements((size * size * size * rank) as u64));

        for mode in [0usize, 2] {
            group.bench_with_input(
                BenchmarkId::new(format!("direct_mode{}", mode), size),
                &size,
                |bencher, _| {
                    bencher.iter(|| black_box(mttkrp_direct(&tensor.view(), &views, mode).unwrap()));
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("indirect_mode{}", mode), size),
                &size,
                |bencher, _| {
                    bencher
                        .iter(|| black_box(mttkrp_indirect(&tensor.view(), &views, mode).unwrap()));
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_khatri_rao, bench_mttkrp);
criterion_main!(benches);
