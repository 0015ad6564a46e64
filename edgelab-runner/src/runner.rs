//! Backtest runner: wires together dataset loading, the engine, metrics and fingerprints.
//!
//! Two entry points:
//! - `run_single_backtest()`: resolves the dataset through a provider, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded candles. Used by batch runs and tests.

use std::time::Instant;

use chrono::Utc;
use edgelab_core::domain::{
    BacktestConfiguration, Candle, ClosedTrade, ConfigError, EquityPoint, StrategyId,
};
use edgelab_core::engine::{run_backtest, EngineError};
use edgelab_core::risk::HaltRecord;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_loader::{DatasetProvider, LoadError};
use crate::fingerprint::{config_hash, dataset_hash, session_id};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner. The caller gets either a full result or exactly one of these.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub session_id: String,
    pub strategy_id: StrategyId,
    pub dataset: String,
    pub config_hash: String,
    pub dataset_hash: String,

    // ── Headline figures ──
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,

    pub metrics: PerformanceMetrics,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Kill-switch trip, if the run was halted.
    pub halt: Option<HaltRecord>,
    pub warmup: usize,
    pub data_point_count: usize,
    pub execution_time_ms: u64,
    pub config: BacktestConfiguration,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }
}

/// Run a single backtest, loading its dataset through `provider`.
///
/// The configuration is validated before any data is read.
pub fn run_single_backtest(
    config: &BacktestConfiguration,
    provider: &dyn DatasetProvider,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let candles = provider.load(&config.dataset)?;
    run_backtest_from_data(config, &candles)
}

/// Run a backtest with pre-loaded candles. No I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfiguration,
    candles: &[Candle],
) -> Result<BacktestResult, RunError> {
    let started = Instant::now();
    let session = session_id(config.strategy_id, Utc::now());

    let run = run_backtest(candles, config)?;
    let metrics = PerformanceMetrics::compute(run.initial_balance, &run.equity_curve, &run.trades);
    let config_hash = config_hash(config)?;
    let dataset_hash = dataset_hash(&candles[..run.candles_processed]);
    let execution_time_ms = started.elapsed().as_millis() as u64;

    if let Some(halt) = &run.halt {
        warn!(
            "{session}: halted at candle {} ({:.2}% drawdown)",
            halt.index, halt.drawdown_percent
        );
    }
    info!(
        "{session}: {} trades, return {:.2}%, max drawdown {:.2}%, {} ms",
        metrics.trade_count,
        metrics.total_return_percent,
        metrics.max_drawdown_percent,
        execution_time_ms
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        session_id: session,
        strategy_id: config.strategy_id,
        dataset: config.dataset.clone(),
        config_hash,
        dataset_hash,
        initial_balance: run.initial_balance,
        final_balance: run.final_balance,
        total_return: metrics.total_return,
        total_return_percent: metrics.total_return_percent,
        win_rate: metrics.win_rate,
        profit_factor: metrics.profit_factor,
        max_drawdown: metrics.max_drawdown,
        max_drawdown_percent: metrics.max_drawdown_percent,
        sharpe_ratio: metrics.sharpe_ratio,
        metrics,
        trades: run.trades,
        equity_curve: run.equity_curve,
        halt: run.halt,
        warmup: run.warmup,
        data_point_count: run.candles_processed,
        execution_time_ms,
        config: config.clone(),
    })
}
