//! BacktestConfiguration: the immutable input of one run.
//!
//! Every nested table carries serde defaults so a minimal TOML file (strategy, dataset,
//! balance, risk, concurrency) is a complete configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::StrategyId;
use super::instrument::{ContractSpec, InstrumentError};

/// Which exit wins when a candle crosses both the stop-loss and the take-profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Assume the stop was hit first (conservative).
    #[default]
    StopLossFirst,
    TakeProfitFirst,
    /// Whichever level is closer to the candle open was hit first; stop-loss on equal distance.
    NearestToOpen,
}

/// A UTC hour window, `start_hour` inclusive and `end_hour` exclusive. Wraps past midnight
/// when `start_hour > end_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl HourWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    fn is_valid(&self) -> bool {
        self.start_hour < 24 && self.end_hour <= 24 && self.start_hour != self.end_hour
    }
}

/// Trading-session windows used by the session-timed strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionWindows {
    /// Session whose high/low forms the breakout range (Asian session).
    pub range: HourWindow,
    /// Session in which range breakouts are traded (London open).
    pub breakout: HourWindow,
    /// High-liquidity windows that raise structure-break confidence.
    pub kill_zones: Vec<HourWindow>,
}

impl Default for SessionWindows {
    fn default() -> Self {
        Self {
            range: HourWindow::new(0, 7),
            breakout: HourWindow::new(7, 12),
            kill_zones: vec![HourWindow::new(7, 10), HourWindow::new(12, 15)],
        }
    }
}

impl SessionWindows {
    pub fn in_kill_zone(&self, hour: u32) -> bool {
        self.kill_zones.iter().any(|w| w.contains(hour))
    }
}

/// Indicator periods. Defaults are the conventional textbook values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub ema_trend: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx_period: usize,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub volume_period: usize,
    /// Candles on each side required to confirm a swing high/low.
    pub swing_strength: usize,
    /// Lower-timeframe candles per higher-timeframe candle.
    pub htf_factor: usize,
    pub htf_ema_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_fast: 20,
            sma_slow: 50,
            ema_fast: 9,
            ema_slow: 21,
            ema_trend: 50,
            rsi_period: 14,
            atr_period: 14,
            bollinger_period: 20,
            bollinger_k: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            stochastic_k: 14,
            stochastic_d: 3,
            volume_period: 20,
            swing_strength: 2,
            htf_factor: 4,
            htf_ema_period: 21,
        }
    }
}

impl IndicatorParams {
    fn periods(&self) -> [(&'static str, usize); 18] {
        [
            ("sma_fast", self.sma_fast),
            ("sma_slow", self.sma_slow),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("ema_trend", self.ema_trend),
            ("rsi_period", self.rsi_period),
            ("atr_period", self.atr_period),
            ("bollinger_period", self.bollinger_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("adx_period", self.adx_period),
            ("stochastic_k", self.stochastic_k),
            ("stochastic_d", self.stochastic_d),
            ("volume_period", self.volume_period),
            ("swing_strength", self.swing_strength),
            ("htf_factor", self.htf_factor),
            ("htf_ema_period", self.htf_ema_period),
        ]
    }
}

/// Per-variant strategy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Target distance as a multiple of the stop distance.
    pub reward_ratio: f64,
    /// Breakout must clear the session range by this many ATRs.
    pub breakout_buffer_atr: f64,
    pub breakout_stop_atr: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub reversion_stop_atr: f64,
    /// Candles scanned for the pullback low/high that anchors the stop.
    pub pullback_lookback: usize,
    /// Candles scanned for swing points, order blocks and gaps.
    pub structure_lookback: usize,
    pub scalp_stop_atr: f64,
    pub scalp_reward_ratio: f64,
    /// Volume must exceed its average by this factor for a scalp.
    pub scalp_volume_spike: f64,
    pub martingale_stop_atr: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            reward_ratio: 2.0,
            breakout_buffer_atr: 0.1,
            breakout_stop_atr: 1.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            reversion_stop_atr: 1.5,
            pullback_lookback: 5,
            structure_lookback: 30,
            scalp_stop_atr: 1.0,
            scalp_reward_ratio: 1.5,
            scalp_volume_spike: 1.5,
            martingale_stop_atr: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MartingaleParams {
    pub base_volume: f64,
    pub multiplier: f64,
    pub max_level: u32,
    /// Cap on the total open volume, in lots.
    pub max_exposure: f64,
}

impl Default for MartingaleParams {
    fn default() -> Self {
        Self {
            base_volume: 0.01,
            multiplier: 2.0,
            max_level: 4,
            max_exposure: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub volume: f64,
    /// Price distance between grid entries.
    pub spacing: f64,
    /// Entries per grid before the level counter resets.
    pub max_levels: u32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            volume: 0.01,
            spacing: 5.0,
            max_levels: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayParams {
    pub martingale: MartingaleParams,
    pub grid: GridParams,
}

fn default_true() -> bool {
    true
}

/// Complete input of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    pub strategy_id: StrategyId,
    /// Dataset identifier handed to the dataset provider.
    pub dataset: String,
    pub initial_balance: f64,
    pub risk_per_trade_percent: f64,
    pub max_concurrent_positions: usize,
    /// Kill-switch threshold; `None` disables it.
    #[serde(default)]
    pub max_drawdown_percent: Option<f64>,
    #[serde(default = "default_true")]
    pub force_close_on_halt: bool,
    #[serde(default)]
    pub tie_break: TieBreakPolicy,
    /// Stop after this many candles and close what is still open.
    #[serde(default)]
    pub max_candles: Option<usize>,
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

/// Configuration errors. Raised before the simulation loop starts; never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("dataset reference is empty")]
    MissingDataset,
    #[error("initial balance must be > 0, got {0}")]
    NonPositiveBalance(f64),
    #[error("risk per trade must be in (0, 100], got {0}")]
    RiskOutOfRange(f64),
    #[error("max concurrent positions must be >= 1")]
    ZeroConcurrency,
    #[error("max drawdown percent must be in (0, 100], got {0}")]
    DrawdownOutOfRange(f64),
    #[error("invalid parameter {name}: {value}")]
    InvalidParam { name: String, value: f64 },
    #[error("invalid session window {name}")]
    InvalidSession { name: String },
    #[error("contract: {0}")]
    Contract(#[from] InstrumentError),
}

fn in_percent_range(value: f64) -> bool {
    value > 0.0 && value <= 100.0
}

impl BacktestConfiguration {
    /// Minimal configuration with every optional table at its default.
    pub fn new(
        strategy_id: StrategyId,
        dataset: impl Into<String>,
        initial_balance: f64,
        risk_per_trade_percent: f64,
        max_concurrent_positions: usize,
    ) -> Self {
        Self {
            strategy_id,
            dataset: dataset.into(),
            initial_balance,
            risk_per_trade_percent,
            max_concurrent_positions,
            max_drawdown_percent: None,
            force_close_on_halt: true,
            tie_break: TieBreakPolicy::default(),
            max_candles: None,
            contract: ContractSpec::default(),
            sessions: SessionWindows::default(),
            indicators: IndicatorParams::default(),
            strategy: StrategyParams::default(),
            overlay: OverlayParams::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.trim().is_empty() {
            return Err(ConfigError::MissingDataset);
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ConfigError::NonPositiveBalance(self.initial_balance));
        }
        if !in_percent_range(self.risk_per_trade_percent) {
            return Err(ConfigError::RiskOutOfRange(self.risk_per_trade_percent));
        }
        if self.max_concurrent_positions == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if let Some(dd) = self.max_drawdown_percent {
            if !in_percent_range(dd) {
                return Err(ConfigError::DrawdownOutOfRange(dd));
            }
        }
        self.contract.validate()?;

        for (name, period) in self.indicators.periods() {
            if period == 0 {
                return Err(ConfigError::InvalidParam {
                    name: name.to_string(),
                    value: 0.0,
                });
            }
        }
        if self.indicators.htf_factor < 2 {
            return Err(ConfigError::InvalidParam {
                name: "htf_factor".into(),
                value: self.indicators.htf_factor as f64,
            });
        }
        positive("bollinger_k", self.indicators.bollinger_k)?;
        positive("reward_ratio", self.strategy.reward_ratio)?;
        positive("scalp_reward_ratio", self.strategy.scalp_reward_ratio)?;
        positive("breakout_stop_atr", self.strategy.breakout_stop_atr)?;
        positive("reversion_stop_atr", self.strategy.reversion_stop_atr)?;
        positive("scalp_stop_atr", self.strategy.scalp_stop_atr)?;
        positive("martingale_stop_atr", self.strategy.martingale_stop_atr)?;
        let buffer = self.strategy.breakout_buffer_atr;
        if !(buffer.is_finite() && buffer >= 0.0) {
            return Err(ConfigError::InvalidParam {
                name: "breakout_buffer_atr".into(),
                value: buffer,
            });
        }
        positive("martingale.base_volume", self.overlay.martingale.base_volume)?;
        positive("martingale.multiplier", self.overlay.martingale.multiplier)?;
        positive("martingale.max_exposure", self.overlay.martingale.max_exposure)?;
        positive("grid.volume", self.overlay.grid.volume)?;
        positive("grid.spacing", self.overlay.grid.spacing)?;
        if self.overlay.grid.max_levels == 0 {
            return Err(ConfigError::InvalidParam {
                name: "grid.max_levels".into(),
                value: 0.0,
            });
        }

        let windows = [("range", self.sessions.range), ("breakout", self.sessions.breakout)];
        for (name, window) in windows {
            if !window.is_valid() {
                return Err(ConfigError::InvalidSession { name: name.into() });
            }
        }
        if self.sessions.kill_zones.iter().any(|w| !w.is_valid()) {
            return Err(ConfigError::InvalidSession {
                name: "kill_zones".into(),
            });
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParam {
            name: name.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BacktestConfiguration {
        BacktestConfiguration::new(StrategyId::SessionBreakout, "xauusd_m15", 10_000.0, 1.0, 3)
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(base().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_balance() {
        let mut config = base();
        config.initial_balance = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveBalance(0.0)));
    }

    #[test]
    fn rejects_risk_out_of_range() {
        let mut config = base();
        config.risk_per_trade_percent = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::RiskOutOfRange(0.0)));
        config.risk_per_trade_percent = 100.5;
        assert_eq!(config.validate(), Err(ConfigError::RiskOutOfRange(100.5)));
        config.risk_per_trade_percent = 100.0;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = base();
        config.max_concurrent_positions = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn rejects_drawdown_out_of_range() {
        let mut config = base();
        config.max_drawdown_percent = Some(150.0);
        assert_eq!(config.validate(), Err(ConfigError::DrawdownOutOfRange(150.0)));
    }

    #[test]
    fn rejects_missing_dataset() {
        let mut config = base();
        config.dataset = "  ".into();
        assert_eq!(config.validate(), Err(ConfigError::MissingDataset));
    }

    #[test]
    fn rejects_zero_period() {
        let mut config = base();
        config.indicators.rsi_period = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParam { ref name, .. }) if name == "rsi_period"
        ));
    }

    fn set_stop_multiple(params: &mut StrategyParams, field: &str, value: f64) {
        match field {
            "breakout_stop_atr" => params.breakout_stop_atr = value,
            "reversion_stop_atr" => params.reversion_stop_atr = value,
            "scalp_stop_atr" => params.scalp_stop_atr = value,
            "martingale_stop_atr" => params.martingale_stop_atr = value,
            other => panic!("unknown field {other}"),
        }
    }

    #[test]
    fn rejects_non_positive_stop_multiples() {
        let fields = [
            "breakout_stop_atr",
            "reversion_stop_atr",
            "scalp_stop_atr",
            "martingale_stop_atr",
        ];
        for field in fields {
            for bad in [-1.0, 0.0, f64::NAN] {
                let mut config = base();
                set_stop_multiple(&mut config.strategy, field, bad);
                assert!(
                    matches!(
                        config.validate(),
                        Err(ConfigError::InvalidParam { ref name, .. }) if name == field
                    ),
                    "{field} = {bad} should be rejected"
                );
            }
        }
    }

    #[test]
    fn breakout_buffer_may_be_zero_but_not_negative() {
        let mut config = base();
        config.strategy.breakout_buffer_atr = 0.0;
        assert_eq!(config.validate(), Ok(()));
        config.strategy.breakout_buffer_atr = -0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParam { ref name, .. }) if name == "breakout_buffer_atr"
        ));
    }

    #[test]
    fn hour_window_wraps_midnight() {
        let window = HourWindow::new(22, 3);
        assert!(window.contains(23));
        assert!(window.contains(2));
        assert!(!window.contains(3));
        assert!(!window.contains(12));
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let text = r#"
            strategy_id = "mean_reversion"
            dataset = "data/xauusd.csv"
            initial_balance = 25000.0
            risk_per_trade_percent = 0.5
            max_concurrent_positions = 2
            max_drawdown_percent = 10.0

            [contract]
            contract_multiplier = 10.0
        "#;
        let config: BacktestConfiguration = toml::from_str(text).unwrap();
        assert_eq!(config.strategy_id, StrategyId::MeanReversion);
        assert_eq!(config.max_drawdown_percent, Some(10.0));
        assert!(config.force_close_on_halt);
        assert_eq!(config.tie_break, TieBreakPolicy::StopLossFirst);
        assert_eq!(config.contract.contract_multiplier, 10.0);
        assert_eq!(config.contract.min_volume, 0.01);
        assert_eq!(config.indicators, IndicatorParams::default());
        assert_eq!(config.validate(), Ok(()));
    }
}
