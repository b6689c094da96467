//! CLI entry point for the nanofolio allocator.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use nanofolio::AssetId;
use nanofolio_allocator::commands::{self, RunOptions, SimulateOptions};
use nanofolio_allocator::config::Config;

#[derive(Parser)]
#[command(name = "allocate")]
#[command(about = "Monte Carlo and maximum-Sharpe allocations from a price CSV")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the sampler seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample, optimize, and print the allocation report
    Run {
        /// Wide CSV of adjusted closes: date,<asset>,...
        prices: PathBuf,

        /// Column to compare against instead of investing in
        #[arg(long)]
        benchmark: Option<String>,

        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Write every Monte Carlo sample to a CSV for scatter plots
    Simulate {
        /// Wide CSV of adjusted closes: date,<asset>,...
        prices: PathBuf,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,

        /// Column to leave out of the sampled universe
        #[arg(long)]
        benchmark: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(seed) = cli.seed {
        config.analysis.random_seed = Some(seed);
    }

    let result = match cli.command {
        Command::Run {
            prices,
            benchmark,
            json,
        } => {
            let opts = RunOptions {
                prices,
                benchmark: benchmark.map(AssetId::new),
                json,
            };
            commands::run(&config, &opts).map(|report| print!("{report}"))
        }
        Command::Simulate {
            prices,
            out,
            benchmark,
        } => {
            let opts = SimulateOptions {
                prices,
                out,
                benchmark: benchmark.map(AssetId::new),
            };
            commands::simulate(&config, &opts).map(|n| println!("{n} samples written"))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}
