//! nanofolio-allocator: allocation reports from local price files.
//!
//! Reads a wide CSV of adjusted closes and an optional TOML config, runs the
//! nanofolio pipeline (Monte Carlo sampling + maximum-Sharpe optimization +
//! benchmark comparison), and renders the result as text, JSON, or a
//! per-sample CSV for scatter plots.

pub mod commands;
pub mod config;
pub mod error;
pub mod prices;
pub mod report;
