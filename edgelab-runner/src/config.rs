//! TOML run configuration.
//!
//! A run file has a required `[backtest]` table and optional tuning tables that map one-to-one
//! onto the core `BacktestConfiguration`:
//!
//! ```toml
//! [backtest]
//! strategy = "session_breakout"
//! dataset = "xauusd_m15.csv"
//! initial_balance = 10000.0
//! risk_per_trade_percent = 1.0
//! max_concurrent_positions = 3
//! max_drawdown_percent = 10.0
//!
//! [contract]
//! contract_multiplier = 100.0
//!
//! [overlay.martingale]
//! multiplier = 2.0
//! ```

use std::path::{Path, PathBuf};

use edgelab_core::domain::{
    BacktestConfiguration, ContractSpec, IndicatorParams, OverlayParams, SessionWindows,
    StrategyId, StrategyParams, TieBreakPolicy,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading or validating a run file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] edgelab_core::domain::ConfigError),
}

/// Top-level run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub contract: ContractSpec,
    #[serde(default)]
    pub sessions: SessionWindows,
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub strategy: StrategyParams,
    #[serde(default)]
    pub overlay: OverlayParams,
}

/// The `[backtest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub strategy: StrategyId,
    pub dataset: String,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    #[serde(default = "default_risk")]
    pub risk_per_trade_percent: f64,
    #[serde(default = "default_max_positions")]
    pub max_concurrent_positions: usize,
    #[serde(default)]
    pub max_drawdown_percent: Option<f64>,
    #[serde(default = "default_true")]
    pub force_close_on_halt: bool,
    #[serde(default)]
    pub tie_break: TieBreakPolicy,
    #[serde(default)]
    pub max_candles: Option<usize>,
}

fn default_initial_balance() -> f64 {
    10_000.0
}

fn default_risk() -> f64 {
    1.0
}

fn default_max_positions() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl BacktestConfig {
    /// Load and validate a run file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a run file from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.to_configuration().validate()?;
        Ok(config)
    }

    /// Flatten into the engine's configuration.
    pub fn to_configuration(&self) -> BacktestConfiguration {
        let b = &self.backtest;
        BacktestConfiguration {
            strategy_id: b.strategy,
            dataset: b.dataset.clone(),
            initial_balance: b.initial_balance,
            risk_per_trade_percent: b.risk_per_trade_percent,
            max_concurrent_positions: b.max_concurrent_positions,
            max_drawdown_percent: b.max_drawdown_percent,
            force_close_on_halt: b.force_close_on_halt,
            tie_break: b.tie_break,
            max_candles: b.max_candles,
            contract: self.contract.clone(),
            sessions: self.sessions.clone(),
            indicators: self.indicators.clone(),
            strategy: self.strategy.clone(),
            overlay: self.overlay.clone(),
        }
    }

    /// Same file with another strategy. Used by batch runs that sweep every variant.
    pub fn with_strategy(&self, strategy: StrategyId) -> Self {
        let mut config = self.clone();
        config.backtest.strategy = strategy;
        config
    }
}

impl From<&BacktestConfiguration> for BacktestConfig {
    fn from(config: &BacktestConfiguration) -> Self {
        Self {
            backtest: BacktestSection {
                strategy: config.strategy_id,
                dataset: config.dataset.clone(),
                initial_balance: config.initial_balance,
                risk_per_trade_percent: config.risk_per_trade_percent,
                max_concurrent_positions: config.max_concurrent_positions,
                max_drawdown_percent: config.max_drawdown_percent,
                force_close_on_halt: config.force_close_on_halt,
                tie_break: config.tie_break,
                max_candles: config.max_candles,
            },
            contract: config.contract.clone(),
            sessions: config.sessions.clone(),
            indicators: config.indicators.clone(),
            strategy: config.strategy.clone(),
            overlay: config.overlay.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[backtest]
strategy = "mean_reversion"
dataset = "xauusd_m15.csv"
"#;

    #[test]
    fn minimal_file_uses_defaults() {
        let config = BacktestConfig::from_toml(MINIMAL).unwrap();
        let engine = config.to_configuration();
        assert_eq!(engine.strategy_id, StrategyId::MeanReversion);
        assert_eq!(engine.initial_balance, 10_000.0);
        assert_eq!(engine.risk_per_trade_percent, 1.0);
        assert_eq!(engine.max_concurrent_positions, 1);
        assert_eq!(engine.max_drawdown_percent, None);
        assert!(engine.force_close_on_halt);
        assert_eq!(engine.tie_break, TieBreakPolicy::StopLossFirst);
        assert_eq!(engine.contract, ContractSpec::gold());
    }

    #[test]
    fn full_file_parses_every_table() {
        let toml = r#"
[backtest]
strategy = "grid"
dataset = "gold.json"
initial_balance = 25000.0
risk_per_trade_percent = 2.5
max_concurrent_positions = 4
max_drawdown_percent = 12.0
force_close_on_halt = false
tie_break = "nearest_to_open"
max_candles = 5000

[contract]
symbol = "XAUUSD"
contract_multiplier = 100.0
commission_per_lot = 7.0

[indicators]
atr_period = 10

[strategy]
reward_ratio = 3.0

[overlay.grid]
spacing = 5.0
max_levels = 4
"#;
        let engine = BacktestConfig::from_toml(toml).unwrap().to_configuration();
        assert_eq!(engine.strategy_id, StrategyId::Grid);
        assert_eq!(engine.max_drawdown_percent, Some(12.0));
        assert!(!engine.force_close_on_halt);
        assert_eq!(engine.tie_break, TieBreakPolicy::NearestToOpen);
        assert_eq!(engine.max_candles, Some(5000));
        assert_eq!(engine.contract.commission_per_lot, 7.0);
        assert_eq!(engine.indicators.atr_period, 10);
        assert_eq!(engine.strategy.reward_ratio, 3.0);
        assert_eq!(engine.overlay.grid.spacing, 5.0);
        assert_eq!(engine.overlay.grid.max_levels, 4);
        // untouched fields keep their defaults
        assert_eq!(engine.overlay.martingale.multiplier, 2.0);
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let toml = "[backtest]\nstrategy = \"scalper_v2\"\ndataset = \"x.csv\"\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn out_of_range_risk_is_rejected() {
        let toml = "[backtest]\nstrategy = \"grid\"\ndataset = \"x.csv\"\n\
                    risk_per_trade_percent = 150.0\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn zero_drawdown_threshold_is_rejected() {
        let toml =
            "[backtest]\nstrategy = \"grid\"\ndataset = \"x.csv\"\nmax_drawdown_percent = 0.0\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = BacktestConfig::from_file(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn engine_config_round_trips_through_the_file_shape() {
        let engine = BacktestConfig::from_toml(MINIMAL).unwrap().to_configuration();
        let back = BacktestConfig::from(&engine).to_configuration();
        assert_eq!(engine, back);
    }

    #[test]
    fn with_strategy_swaps_only_the_variant() {
        let config = BacktestConfig::from_toml(MINIMAL).unwrap();
        let swapped = config.with_strategy(StrategyId::Martingale);
        assert_eq!(swapped.backtest.strategy, StrategyId::Martingale);
        assert_eq!(swapped.backtest.dataset, config.backtest.dataset);
    }
}
