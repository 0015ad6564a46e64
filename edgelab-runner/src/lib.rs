//! EdgeLab Runner: backtest orchestration, datasets, metrics and export.
//!
//! This crate builds on `edgelab-core` to provide:
//! - TOML run configuration
//! - Dataset provider seam with CSV/JSON file loading
//! - Single-backtest runner with metrics and fingerprints
//! - Parallel batch runs over independent configurations
//! - JSON and CSV artifact export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod fingerprint;
pub mod metrics;
pub mod runner;

pub use batch::{run_batch, run_batch_with_progress, strategy_sweep, BatchOutcome};
pub use config::{BacktestConfig, BacktestSection, ConfigError};
pub use data_loader::{DatasetProvider, FileDatasetProvider, InMemoryDatasetProvider, LoadError};
pub use export::{
    export_equity_csv, export_json, export_trades_csv, import_json, load_artifacts,
    save_artifacts,
};
pub use metrics::{ExitReasonCounts, PerformanceMetrics};
pub use runner::{
    run_backtest_from_data, run_single_backtest, BacktestResult, RunError, SCHEMA_VERSION,
};
