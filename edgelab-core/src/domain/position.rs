//! Position: a trade that has been accepted but not yet closed.
//!
//! Lifecycle: `Pending` (accepted by the risk governor, not yet priced) → `Open` (filled at the
//! candle close) → closed. Closing consumes the position and yields an immutable
//! [`ClosedTrade`], so a closed position cannot be touched again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PositionId, StrategyId};
use super::instrument::ContractSpec;
use super::signal::Side;
use super::trade::{ClosedTrade, ExitReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    Pending,
    Open,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub state: PositionState,
    pub side: Side,
    pub volume: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub strategy_id: StrategyId,
    pub confidence: f64,
    pub reason: String,
    /// Candle index at which the entry was accepted.
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    /// Zero while pending.
    pub entry_price: f64,
    /// Best unrealized P&L seen while open (>= 0).
    pub max_favorable_excursion: f64,
    /// Worst unrealized P&L seen while open (<= 0).
    pub max_adverse_excursion: f64,
}

impl Position {
    /// Create a pending position from an accepted entry.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        id: PositionId,
        side: Side,
        volume: f64,
        stop_loss: f64,
        take_profit: f64,
        strategy_id: StrategyId,
        confidence: f64,
        reason: String,
        entry_index: usize,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            state: PositionState::Pending,
            side,
            volume,
            stop_loss,
            take_profit,
            strategy_id,
            confidence,
            reason,
            entry_index,
            entry_time,
            entry_price: 0.0,
            max_favorable_excursion: 0.0,
            max_adverse_excursion: 0.0,
        }
    }

    /// Pending → Open at `fill_price`. No-op on a position that is already open.
    pub fn fill(&mut self, fill_price: f64) {
        if self.state == PositionState::Pending {
            self.entry_price = fill_price;
            self.state = PositionState::Open;
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == PositionState::Open
    }

    /// Unrealized P&L at `price`, before commission. Zero while pending.
    pub fn unrealized_pnl(&self, price: f64, contract: &ContractSpec) -> f64 {
        if !self.is_open() {
            return 0.0;
        }
        contract.price_move_value((price - self.entry_price) * self.side.sign(), self.volume)
    }

    /// Record the best and worst unrealized P&L reachable between `low` and `high`.
    pub fn track_excursion(&mut self, high: f64, low: f64, contract: &ContractSpec) {
        if !self.is_open() {
            return;
        }
        let (best, worst) = match self.side {
            Side::Buy => (high, low),
            Side::Sell => (low, high),
        };
        let favorable = self.unrealized_pnl(best, contract);
        let adverse = self.unrealized_pnl(worst, contract);
        self.max_favorable_excursion = self.max_favorable_excursion.max(favorable);
        self.max_adverse_excursion = self.max_adverse_excursion.min(adverse);
    }

    /// Open → closed. Consumes the position.
    pub fn close(
        self,
        exit_index: usize,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        reason: ExitReason,
        contract: &ContractSpec,
    ) -> ClosedTrade {
        let gross_pnl = self.unrealized_pnl(exit_price, contract);
        let commission = contract.commission(self.volume);
        ClosedTrade {
            id: self.id,
            side: self.side,
            strategy_id: self.strategy_id,
            confidence: self.confidence,
            entry_reason: self.reason,
            volume: self.volume,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            entry_index: self.entry_index,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            exit_index,
            exit_time,
            exit_price,
            exit_reason: reason,
            gross_pnl,
            commission,
            pnl: gross_pnl - commission,
            duration_candles: exit_index.saturating_sub(self.entry_index),
            duration_seconds: (exit_time - self.entry_time).num_seconds(),
            max_favorable_excursion: self.max_favorable_excursion,
            max_adverse_excursion: self.max_adverse_excursion,
        }
    }
}
