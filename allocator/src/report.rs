//! Allocation report: the headline numbers of one analysis run.

use chrono::{DateTime, NaiveDate, Utc};
use nanofolio::{Analysis, AssetId, BenchmarkComparison, Diagnostics, Sample};
use serde::Serialize;

/// One row of the allocation table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub asset: AssetId,
    pub weight: f64,
}

/// Sharpe ratios in JSON: a number when finite, `"inf"` / `"-inf"` for a
/// riskless allocation. Undefined ratios (`None`) stay `null`.
mod ratio {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub mod option {
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            value: &Option<f64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// A Monte Carlo sample flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub expected_return: f64,
    pub volatility: f64,
    #[serde(serialize_with = "ratio::option::serialize")]
    pub sharpe: Option<f64>,
    pub weights: Vec<f64>,
}

/// Portfolio-versus-benchmark block of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    pub benchmark: AssetId,
    pub expected_return: f64,
    pub volatility: f64,
    #[serde(serialize_with = "ratio::serialize")]
    pub sharpe: f64,
    #[serde(serialize_with = "ratio::serialize")]
    pub portfolio_sharpe: f64,
    pub excess_return: f64,
    pub volatility_difference: f64,
    pub outperforms: bool,
}

impl From<&BenchmarkComparison> for BenchmarkSummary {
    fn from(cmp: &BenchmarkComparison) -> Self {
        Self {
            benchmark: cmp.benchmark.clone(),
            expected_return: cmp.benchmark_performance.expected_return,
            volatility: cmp.benchmark_performance.volatility,
            sharpe: cmp.benchmark_sharpe,
            portfolio_sharpe: cmp.portfolio_sharpe,
            excess_return: cmp.excess_return,
            volatility_difference: cmp.volatility_difference,
            outperforms: cmp.outperforms(),
        }
    }
}

impl SampleSummary {
    fn new(sample: &Sample, risk_free_rate: f64) -> Self {
        Self {
            expected_return: sample.performance.expected_return,
            volatility: sample.performance.volatility,
            sharpe: sample.performance.sharpe(risk_free_rate).ok(),
            weights: sample.weights.to_vec(),
        }
    }
}

/// Serializable summary of an [`Analysis`].
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub periods: usize,
    pub risk_free_rate: f64,
    pub allocation: Vec<Holding>,
    pub expected_return: f64,
    pub volatility: f64,
    /// `None` when the optimum is riskless and earns exactly the risk-free rate.
    #[serde(serialize_with = "ratio::option::serialize")]
    pub sharpe: Option<f64>,
    pub diagnostics: Option<Diagnostics>,
    pub num_portfolios: usize,
    pub best_sample: Option<SampleSummary>,
    pub safest_sample: Option<SampleSummary>,
    pub benchmark: Option<BenchmarkSummary>,
}

impl Report {
    pub fn new(analysis: &Analysis) -> Self {
        let rf = analysis.config.risk_free_rate;
        let optimum = &analysis.optimum;
        let dates = analysis.returns.dates();

        Self {
            generated_at: Utc::now(),
            start: dates.first().copied(),
            end: dates.last().copied(),
            periods: analysis.returns.num_periods(),
            risk_free_rate: rf,
            allocation: optimum
                .allocation()
                .map(|(asset, weight)| Holding {
                    asset: asset.clone(),
                    weight,
                })
                .collect(),
            expected_return: optimum.performance.expected_return,
            volatility: optimum.performance.volatility,
            sharpe: optimum.performance.sharpe(rf).ok(),
            diagnostics: optimum.diagnostics.clone(),
            num_portfolios: analysis.simulation.len(),
            best_sample: analysis
                .simulation
                .max_sharpe(rf)
                .map(|s| SampleSummary::new(s, rf)),
            safest_sample: analysis
                .simulation
                .min_volatility()
                .map(|s| SampleSummary::new(s, rf)),
            benchmark: analysis.benchmark.as_ref().map(BenchmarkSummary::from),
        }
    }
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".into(), |v| format!("{v:.2}"))
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            writeln!(f, "Returns {start} .. {end} ({} periods)", self.periods)?;
        }
        writeln!(
            f,
            "Optimal allocation (max Sharpe, rf {:.2}%)",
            self.risk_free_rate * 100.0
        )?;
        for h in &self.allocation {
            writeln!(f, "  {:<16} {:>8.2}%", h.asset.as_str(), h.weight * 100.0)?;
        }
        writeln!(f, "  Expected return: {:>8.2}%", self.expected_return * 100.0)?;
        writeln!(f, "  Volatility:      {:>8.2}%", self.volatility * 100.0)?;
        writeln!(f, "  Sharpe:          {:>8}", ratio(self.sharpe))?;
        if let Some(d) = &self.diagnostics {
            writeln!(
                f,
                "  Solver:          {:?} after {} iterations",
                d.termination, d.iterations
            )?;
        }

        writeln!(f, "Monte Carlo ({} portfolios)", self.num_portfolios)?;
        if let Some(s) = &self.best_sample {
            writeln!(
                f,
                "  Best Sharpe:     {:>8}  ({:.2}% / {:.2}%)",
                ratio(s.sharpe),
                s.expected_return * 100.0,
                s.volatility * 100.0
            )?;
        }
        if let Some(s) = &self.safest_sample {
            writeln!(f, "  Lowest vol:      {:>8.2}%", s.volatility * 100.0)?;
        }

        if let Some(b) = &self.benchmark {
            writeln!(f, "Benchmark {}", b.benchmark)?;
            writeln!(f, "  Expected return: {:>8.2}%", b.expected_return * 100.0)?;
            writeln!(f, "  Volatility:      {:>8.2}%", b.volatility * 100.0)?;
            writeln!(f, "  Sharpe:          {:>8.2}", b.sharpe)?;
            writeln!(f, "  Outperformance:  {:>+8.2}%", b.excess_return * 100.0)?;
        }
        Ok(())
    }
}
