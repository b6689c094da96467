//! Allocation invariants: simplex feasibility, determinism, optimality against
//! sampling, diversification, degenerate risk.

use nanofolio::{
    AllocationOptimizer, AssetId, Bounds, Error, LinearEquality, Minimizer, MonteCarloConfig,
    OptimizerConfig, PerformanceEvaluator, ReturnMatrix, SpectralProjectedGradient, Weights,
    sample_portfolios, sharpe_ratio,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn ids(n: usize) -> Vec<AssetId> {
    (0..n).map(|i| AssetId::new(format!("S{i:02}"))).collect()
}

/// Daily returns with a shared market factor and per-asset drift/volatility.
fn synthetic_returns(days: usize, seed: u64) -> ReturnMatrix {
    shifted_returns(days, seed, 0.0)
}

/// `synthetic_returns` with `shift` added to every asset's daily drift.
fn shifted_returns(days: usize, seed: u64, shift: f64) -> ReturnMatrix {
    let drift = [0.0008, 0.0005, 0.0003, 0.0006].map(|d| d + shift);
    let idio = [0.020, 0.012, 0.008, 0.016];
    let beta = [1.2, 0.8, 0.3, 1.0];

    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..days)
        .map(|_| {
            let market = 0.01 * (rng.r#gen::<f64>() - 0.5);
            (0..4)
                .map(|j| drift[j] + beta[j] * market + idio[j] * (rng.r#gen::<f64>() - 0.5))
                .collect()
        })
        .collect();

    ReturnMatrix::new(ids(4), rows).unwrap()
}

fn assert_on_simplex(w: &[f64]) {
    assert!(w.iter().all(|x| (0.0..=1.0).contains(x)), "weights={w:?}");
    let sum: f64 = w.iter().sum();
    assert!((sum - 1.0).abs() <= 1e-9, "sum={sum}");
}

fn optimizer() -> AllocationOptimizer {
    AllocationOptimizer::new(OptimizerConfig::default()).unwrap()
}

// === Simplex feasibility ===

#[test]
fn sampled_weights_are_feasible() {
    let r = synthetic_returns(250, 1);
    let config = MonteCarloConfig {
        num_portfolios: 2_000,
        seed: Some(1),
        ..Default::default()
    };
    let set = sample_portfolios(&r, &config).unwrap();
    assert_eq!(set.len(), 2_000);
    for s in &set {
        assert_on_simplex(&s.weights);
    }
}

#[test]
fn optimized_weights_are_feasible() {
    for seed in 0..5 {
        let r = synthetic_returns(300, seed);
        assert_on_simplex(&optimizer().max_sharpe(&r).unwrap().weights);
        assert_on_simplex(&optimizer().min_volatility(&r).unwrap().weights);
    }
}

// === Single asset ===

#[test]
fn single_asset_gets_full_weight() {
    let r = ReturnMatrix::new(
        ids(1),
        vec![vec![0.01], vec![-0.005], vec![0.007], vec![0.002]],
    )
    .unwrap();

    let res = optimizer().max_sharpe(&r).unwrap();
    assert_eq!(res.weights.as_slice(), &[1.0]);

    let direct = PerformanceEvaluator::daily(&r).evaluate(&[1.0]).unwrap();
    assert_eq!(res.performance, direct);
}

// === Diversification ===

#[test]
fn perfectly_negatively_correlated_pair_diversifies() {
    // Deviations are exact binary fractions so the two columns mirror each other bit for bit.
    let m = 1.0 / 1024.0;
    let d = [3.0, -1.0, 2.0, -4.0, 1.0, -2.0, 4.0, -3.0].map(|x: f64| x / 1024.0);
    let rows = d.iter().map(|di| vec![m + di, m - di]).collect();
    let r = ReturnMatrix::new(ids(2), rows).unwrap();

    let evaluator = PerformanceEvaluator::daily(&r);
    let vol_a = evaluator.evaluate(&[1.0, 0.0]).unwrap().volatility;
    let vol_b = evaluator.evaluate(&[0.0, 1.0]).unwrap().volatility;
    assert!((vol_a - vol_b).abs() < 1e-15);

    let res = optimizer().max_sharpe(&r).unwrap();
    assert_on_simplex(&res.weights);
    assert!(res.performance.volatility < vol_a);
    assert!(res.performance.volatility < vol_b);
}

#[test]
fn min_volatility_diversifies_uncorrelated_assets() {
    let r = synthetic_returns(500, 17);
    let res = optimizer().min_volatility(&r).unwrap();
    let evaluator = PerformanceEvaluator::daily(&r);
    for i in 0..4 {
        let single = evaluator.evaluate(&Weights::single(4, i).unwrap()).unwrap();
        assert!(res.performance.volatility < single.volatility);
    }
}

// === Sampler parameters and determinism ===

#[test]
fn zero_portfolios_rejected() {
    let r = synthetic_returns(50, 2);
    let config = MonteCarloConfig {
        num_portfolios: 0,
        seed: Some(2),
        ..Default::default()
    };
    assert!(matches!(
        sample_portfolios(&r, &config),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn fixed_seed_is_deterministic() {
    let r = synthetic_returns(120, 3);
    let config = MonteCarloConfig {
        num_portfolios: 1_000,
        seed: Some(1234),
        ..Default::default()
    };
    let a = sample_portfolios(&r, &config).unwrap();
    let b = sample_portfolios(&r, &config).unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x, y);
    }
}

// === Optimality ===

#[test]
fn optimizer_beats_monte_carlo() {
    let rf = 0.02;
    for seed in [5, 6, 7] {
        let r = synthetic_returns(500, seed);
        let config = MonteCarloConfig {
            num_portfolios: 10_000,
            seed: Some(seed),
            ..Default::default()
        };
        let set = sample_portfolios(&r, &config).unwrap();
        let mc_best = set
            .max_sharpe(rf)
            .unwrap()
            .performance
            .sharpe(rf)
            .unwrap();

        let opt = optimizer().max_sharpe(&r).unwrap();
        let opt_sr = opt.performance.sharpe(rf).unwrap();

        assert!(
            opt_sr >= mc_best - 1e-6,
            "seed={seed}: optimizer {opt_sr} < monte carlo {mc_best}"
        );
    }
}

#[test]
fn optimizer_beats_monte_carlo_when_assets_lose_money() {
    let rf = 0.02;
    for seed in [11, 12, 13, 14] {
        let r = shifted_returns(60, seed, -0.004);
        let config = MonteCarloConfig {
            num_portfolios: 5_000,
            seed: Some(seed),
            ..Default::default()
        };
        let set = sample_portfolios(&r, &config).unwrap();
        let mc_best = set.max_sharpe(rf).unwrap().performance.sharpe(rf).unwrap();

        let evaluator = PerformanceEvaluator::daily(&r);
        let corner_best = (0..4)
            .map(|i| {
                let w = Weights::single(4, i).unwrap();
                evaluator.evaluate(&w).unwrap().sharpe(rf).unwrap()
            })
            .fold(f64::NEG_INFINITY, f64::max);

        let opt = optimizer().max_sharpe(&r).unwrap();
        let opt_sr = opt.performance.sharpe(rf).unwrap();
        assert!(
            opt_sr >= mc_best - 1e-9,
            "seed={seed}: optimizer {opt_sr} < monte carlo {mc_best}"
        );
        assert!(
            opt_sr >= corner_best - 1e-9,
            "seed={seed}: optimizer {opt_sr} < best single asset {corner_best}"
        );
    }
}

#[test]
fn optimizer_converges_across_drift_regimes() {
    let mut failures = 0;
    let mut runs = 0;
    for seed in 0..40 {
        for shift in [-0.003, 0.0, 0.003] {
            let r = shifted_returns(80, 100 + seed, shift);
            for result in [optimizer().max_sharpe(&r), optimizer().min_volatility(&r)] {
                runs += 1;
                match result {
                    Ok(res) => assert_on_simplex(&res.weights),
                    Err(Error::OptimizationDidNotConverge { .. }) => failures += 1,
                    Err(e) => panic!("seed={seed} shift={shift}: unexpected error {e}"),
                }
            }
        }
    }
    assert!(
        failures * 50 <= runs,
        "{failures} of {runs} solves did not converge"
    );
}

#[test]
fn higher_risk_free_rate_does_not_raise_sharpe() {
    let r = synthetic_returns(400, 9);
    let low = AllocationOptimizer::new(OptimizerConfig {
        risk_free_rate: 0.0,
        ..Default::default()
    })
    .unwrap()
    .max_sharpe(&r)
    .unwrap();
    let high = AllocationOptimizer::new(OptimizerConfig {
        risk_free_rate: 0.05,
        ..Default::default()
    })
    .unwrap()
    .max_sharpe(&r)
    .unwrap();

    let s_low = low.performance.sharpe(0.0).unwrap();
    let s_high = high.performance.sharpe(0.05).unwrap();
    assert!(s_high <= s_low + 1e-9);
}

// === Degenerate risk ===

#[test]
fn zero_variance_asset_forced_by_bounds() {
    let rows = vec![
        vec![0.0, 0.010],
        vec![0.0, -0.004],
        vec![0.0, 0.006],
        vec![0.0, -0.001],
    ];
    let r = ReturnMatrix::new(ids(2), rows).unwrap();
    let evaluator = PerformanceEvaluator::daily(&r);

    // Bounds pin everything onto the riskless, returnless asset.
    let bounds = Bounds {
        lower: vec![1.0, 0.0],
        upper: vec![1.0, 0.0],
    };
    let variance = |w: &[f64]| evaluator.variance(w).unwrap();
    let out = SpectralProjectedGradient::default()
        .minimize(&variance, &[0.5, 0.5], &[LinearEquality::sum_to_one(2)], &bounds)
        .unwrap();
    assert!(out.converged);
    assert_eq!(out.solution, vec![1.0, 0.0]);

    let perf = evaluator.evaluate(&out.solution).unwrap();
    assert_eq!(perf.volatility, 0.0);
    assert_eq!(perf.expected_return, 0.0);
    assert!(matches!(
        sharpe_ratio(&perf, 0.0),
        Err(Error::DegenerateRisk { .. })
    ));
}
