//! TradingSignal: the output of one strategy evaluation.
//!
//! Signals are produced fresh on every evaluation and never mutated afterwards.
//! They describe what the strategy wants, not what the risk governor allows.

use serde::{Deserialize, Serialize};

use super::ids::StrategyId;

/// Entries below this confidence are never executed.
pub const MIN_EXECUTION_CONFIDENCE: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// Trade direction of an entry; a Hold never becomes a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl SignalAction {
    pub fn side(&self) -> Option<Side> {
        match self {
            SignalAction::Buy => Some(Side::Buy),
            SignalAction::Sell => Some(Side::Sell),
            SignalAction::Hold => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub action: SignalAction,
    /// 0 to 100.
    pub confidence: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: f64,
    pub strategy_id: StrategyId,
    pub reason: String,
}

impl TradingSignal {
    pub fn hold(strategy_id: StrategyId, reason: impl Into<String>) -> Self {
        Self {
            action: SignalAction::Hold,
            confidence: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            risk_reward: 0.0,
            strategy_id,
            reason: reason.into(),
        }
    }

    /// Build an entry signal. Confidence is clamped to [0, 100] and the risk/reward ratio is
    /// derived from the levels (0 when the stop distance is zero).
    pub fn entry(
        side: Side,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
        confidence: f64,
        strategy_id: StrategyId,
        reason: impl Into<String>,
    ) -> Self {
        let risk = (entry_price - stop_loss).abs();
        let reward = (take_profit - entry_price).abs();
        let risk_reward = if risk > 0.0 { reward / risk } else { 0.0 };
        Self {
            action: match side {
                Side::Buy => SignalAction::Buy,
                Side::Sell => SignalAction::Sell,
            },
            confidence: confidence.clamp(0.0, 100.0),
            stop_loss,
            take_profit,
            risk_reward,
            strategy_id,
            reason: reason.into(),
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == SignalAction::Hold
    }

    /// True for a buy/sell at or above the execution threshold.
    pub fn is_executable(&self) -> bool {
        !self.is_hold() && self.confidence >= MIN_EXECUTION_CONFIDENCE
    }
}
