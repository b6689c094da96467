//! Optimizer benchmarks: max-Sharpe and min-volatility solves.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nanofolio::{AllocationOptimizer, AssetId, OptimizerConfig, ReturnMatrix};

/// Daily returns with per-asset drift so the Sharpe optimum is interior.
fn generate_returns(days: usize, assets: usize) -> ReturnMatrix {
    let mut rng_state: u32 = 123;
    let rows = (0..days)
        .map(|_| {
            (0..assets)
                .map(|j| {
                    rng_state ^= rng_state << 13;
                    rng_state ^= rng_state >> 17;
                    rng_state ^= rng_state << 5;
                    let noise = (rng_state % 401) as f64 / 10_000.0 - 0.02;
                    noise + 0.0002 * (j % 5) as f64
                })
                .collect()
        })
        .collect();
    let ids = (0..assets).map(|i| AssetId::new(format!("S{i:03}"))).collect();
    ReturnMatrix::new(ids, rows).unwrap()
}

fn bench_max_sharpe(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer/max_sharpe");
    let optimizer = AllocationOptimizer::new(OptimizerConfig::default()).unwrap();

    for assets in [4, 16, 64] {
        let returns = generate_returns(1_000, assets);
        group.bench_with_input(BenchmarkId::from_parameter(assets), &returns, |b, r| {
            b.iter(|| black_box(optimizer.max_sharpe(r)));
        });
    }

    group.finish();
}

fn bench_min_volatility(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer/min_volatility");
    let optimizer = AllocationOptimizer::new(OptimizerConfig::default()).unwrap();

    for assets in [4, 16, 64] {
        let returns = generate_returns(1_000, assets);
        group.bench_with_input(BenchmarkId::from_parameter(assets), &returns, |b, r| {
            b.iter(|| black_box(optimizer.min_volatility(r)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_max_sharpe, bench_min_volatility);
criterion_main!(benches);
