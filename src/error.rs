//! Error types for the analytics core.

/// All failures the analytics core can surface to a caller.
///
/// Nothing in the crate retries or swallows these; retry policy (a different
/// initial guess, falling back to the best Monte Carlo sample) belongs to the
/// caller.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Too few price rows to compute a single return.
    #[error("insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A vector or row does not match the asset count it is paired with.
    #[error("dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The solver exhausted its budget before meeting its tolerance.
    #[error(
        "optimization did not converge after {iterations} iterations (residual {tolerance:e})"
    )]
    OptimizationDidNotConverge {
        /// Last iterate reached by the solver.
        last_iterate: Vec<f64>,
        /// Achieved projected-gradient residual.
        tolerance: f64,
        iterations: usize,
    },

    /// A risk-adjusted ratio hit an unresolvable 0/0.
    #[error("degenerate risk: excess return {excess_return} over volatility {volatility}")]
    DegenerateRisk { excess_return: f64, volatility: f64 },

    /// A configuration value or argument is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A price cell is non-finite or non-positive.
    #[error("invalid price for {asset} at row {row}: {value}")]
    InvalidPrice {
        asset: String,
        row: usize,
        value: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
