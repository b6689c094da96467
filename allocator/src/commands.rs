//! Subcommand implementations.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;
use nanofolio::{Analysis, AssetId, ReturnMatrix, SimulationResultSet, sample_portfolios};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::prices::load_prices;
use crate::report::Report;

/// Options for `allocate run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub prices: PathBuf,
    pub benchmark: Option<AssetId>,
    pub json: Option<PathBuf>,
}

/// Options for `allocate simulate`.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub prices: PathBuf,
    pub out: PathBuf,
    /// Excluded from the sampled universe when set.
    pub benchmark: Option<AssetId>,
}

/// Full analysis: sampling, optimization, benchmark comparison.
pub fn run(config: &Config, opts: &RunOptions) -> Result<Report> {
    let prices = load_prices(&opts.prices)?;

    let started = Instant::now();
    let analysis = Analysis::run_with_solver(
        &prices,
        &config.analysis,
        opts.benchmark.as_ref(),
        config.solver()?,
    )?;
    info!(
        "analysis of {} assets finished in {:.1?}",
        analysis.returns.num_assets(),
        started.elapsed()
    );

    let report = Report::new(&analysis);
    if let Some(path) = &opts.json {
        write_json(&report, path)?;
        info!("wrote report to {}", path.display());
    }
    Ok(report)
}

/// Sample the allocation simplex and write every sample as a CSV row.
///
/// Returns the number of samples written.
pub fn simulate(config: &Config, opts: &SimulateOptions) -> Result<usize> {
    config.validate()?;
    let prices = load_prices(&opts.prices)?;
    let universe = match &opts.benchmark {
        Some(b) => prices.without(b)?,
        None => prices,
    };
    let returns = ReturnMatrix::from_prices(&universe)?;

    let started = Instant::now();
    let set = sample_portfolios(&returns, &config.analysis.monte_carlo())?;
    info!(
        "sampled {} portfolios in {:.1?}",
        set.len(),
        started.elapsed()
    );

    write_samples(&set, config.analysis.risk_free_rate, &opts.out)?;
    info!("wrote samples to {}", opts.out.display());
    Ok(set.len())
}

fn write_json(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Header `expected_return,volatility,sharpe,<assets...>`. A degenerate
/// Sharpe ratio is left empty.
fn write_samples(set: &SimulationResultSet, risk_free_rate: f64, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec![
        "expected_return".to_string(),
        "volatility".to_string(),
        "sharpe".to_string(),
    ];
    header.extend(set.assets().iter().map(|a| a.to_string()));
    writer.write_record(&header)?;

    for sample in set {
        let perf = &sample.performance;
        let mut record = vec![
            perf.expected_return.to_string(),
            perf.volatility.to_string(),
            perf.sharpe(risk_free_rate)
                .map_or_else(|_| String::new(), |s| s.to_string()),
        ];
        record.extend(sample.weights.iter().map(|w| w.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
