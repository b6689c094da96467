//! Error types for the allocator.

use std::path::PathBuf;

/// All errors that can occur while producing a report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to open price file {path}: {source}")]
    PricesRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("price file error: {0}")]
    Prices(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("analysis failed: {0}")]
    Analysis(#[from] nanofolio::Error),
}

impl Error {
    /// Process exit code: 2 for failures inside the analytics, 1 for bad input.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Analysis(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
