//! TOML configuration loading and validation.

use std::path::Path;

use nanofolio::{AnalysisConfig, SolverConfig, SpectralProjectedGradient};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub solver: SolverConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        self.analysis
            .validate()
            .map_err(|e| Error::Config(format!("[analysis] {e}")))?;
        self.solver
            .validate()
            .map_err(|e| Error::Config(format!("[solver] {e}")))?;
        Ok(())
    }

    /// Solver built from the `[solver]` section.
    pub fn solver(&self) -> Result<SpectralProjectedGradient> {
        SpectralProjectedGradient::new(self.solver.clone())
            .map_err(|e| Error::Config(format!("[solver] {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[analysis]
num_portfolios = 5000
risk_free_rate = 0.03
random_seed = 42
trading_days_per_year = 252

[solver]
max_iterations = 500
tolerance = 1e-9
ftol = 1e-13
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(config.analysis.num_portfolios, 5000);
        assert_eq!(config.analysis.risk_free_rate, 0.03);
        assert_eq!(config.analysis.random_seed, Some(42));
        assert_eq!(config.solver.max_iterations, 500);
        assert_eq!(config.solver.tolerance, 1e-9);
    }

    #[test]
    fn empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.analysis.random_seed, None);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = Config::from_toml("[analysis]\nrandom_seed = 7\n").unwrap();
        assert_eq!(config.analysis.random_seed, Some(7));
        assert_eq!(config.analysis.num_portfolios, 10_000);
        assert_eq!(config.solver, SolverConfig::default());
    }

    #[test]
    fn validate_catches_zero_portfolios() {
        let toml = example_toml().replace("5000", "0");
        assert!(matches!(Config::from_toml(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn validate_catches_bad_tolerance() {
        let toml = example_toml().replace("1e-9", "-1.0");
        assert!(matches!(Config::from_toml(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn unparseable_toml_is_parse_error() {
        assert!(matches!(
            Config::from_toml("[analysis\n"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load(Path::new("/nonexistent/allocate.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
