//! ClosedTrade: a completed round-trip trade in the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{PositionId, StrategyId};
use super::signal::Side;

/// Why a position was closed. This is the complete set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfTest,
    FailSafe,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::EndOfTest => "end_of_test",
            ExitReason::FailSafe => "fail_safe",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable closed trade with entry, exit, P&L and excursion data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    // ── Identification ──
    pub id: PositionId,
    pub side: Side,
    pub strategy_id: StrategyId,
    pub confidence: f64,
    pub entry_reason: String,

    // ── Size and levels ──
    pub volume: f64,
    pub stop_loss: f64,
    pub take_profit: f64,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── PnL ──
    pub gross_pnl: f64,
    pub commission: f64,
    pub pnl: f64,

    // ── Duration ──
    pub duration_candles: usize,
    pub duration_seconds: i64,

    // ── Excursion ──
    pub max_favorable_excursion: f64,
    pub max_adverse_excursion: f64,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }
}
