//! Trade lifecycle manager: owns the open positions and the closed-trade ledger.
//!
//! Positions enter already filled (Open). Each candle, [`TradeBook::evaluate_exits`] checks
//! stop-loss and take-profit against the candle's high/low; exits fill at the level. A position
//! is never exit-checked on the candle that opened it.

use crate::domain::{
    Candle, ClosedTrade, ContractSpec, ExitReason, Position, Side, TieBreakPolicy,
};

#[derive(Debug, Clone, Default)]
pub struct TradeBook {
    open: Vec<Position>,
    ledger: Vec<ClosedTrade>,
}

impl TradeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn ledger(&self) -> &[ClosedTrade] {
        &self.ledger
    }

    pub fn into_ledger(self) -> Vec<ClosedTrade> {
        self.ledger
    }

    /// Add a filled position.
    pub fn insert(&mut self, position: Position) {
        debug_assert!(position.is_open(), "only filled positions enter the book");
        self.open.push(position);
    }

    /// Sum of unrealized P&L of every open position at `price`.
    pub fn unrealized_pnl(&self, price: f64, contract: &ContractSpec) -> f64 {
        self.open
            .iter()
            .map(|p| p.unrealized_pnl(price, contract))
            .sum()
    }

    /// Close every position whose stop or target was crossed on `candle`. Returns the trades
    /// closed by this call, in the order the positions were opened.
    pub fn evaluate_exits(
        &mut self,
        index: usize,
        candle: &Candle,
        tie_break: TieBreakPolicy,
        contract: &ContractSpec,
    ) -> &[ClosedTrade] {
        let first_new = self.ledger.len();
        let mut still_open = Vec::with_capacity(self.open.len());

        for mut position in self.open.drain(..) {
            if position.entry_index >= index {
                still_open.push(position);
                continue;
            }

            let lo = position.stop_loss.min(position.take_profit);
            let hi = position.stop_loss.max(position.take_profit);
            position.track_excursion(candle.high.clamp(lo, hi), candle.low.clamp(lo, hi), contract);

            match exit_level(&position, candle, tie_break) {
                Some((price, reason)) => {
                    self.ledger
                        .push(position.close(index, candle.timestamp, price, reason, contract));
                }
                None => still_open.push(position),
            }
        }

        self.open = still_open;
        &self.ledger[first_new..]
    }

    /// Close every open position at `price` with `reason`.
    pub fn close_all(
        &mut self,
        index: usize,
        candle: &Candle,
        price: f64,
        reason: ExitReason,
        contract: &ContractSpec,
    ) -> &[ClosedTrade] {
        let first_new = self.ledger.len();
        for position in self.open.drain(..) {
            self.ledger
                .push(position.close(index, candle.timestamp, price, reason, contract));
        }
        &self.ledger[first_new..]
    }
}

/// Exit price and reason for `position` on `candle`, if either level was crossed.
fn exit_level(
    position: &Position,
    candle: &Candle,
    tie_break: TieBreakPolicy,
) -> Option<(f64, ExitReason)> {
    let (stop_hit, target_hit) = match position.side {
        Side::Buy => (
            candle.low <= position.stop_loss,
            candle.high >= position.take_profit,
        ),
        Side::Sell => (
            candle.high >= position.stop_loss,
            candle.low <= position.take_profit,
        ),
    };
    let stop = (position.stop_loss, ExitReason::StopLoss);
    let target = (position.take_profit, ExitReason::TakeProfit);

    match (stop_hit, target_hit) {
        (false, false) => None,
        (true, false) => Some(stop),
        (false, true) => Some(target),
        (true, true) => Some(match tie_break {
            TieBreakPolicy::StopLossFirst => stop,
            TieBreakPolicy::TakeProfitFirst => target,
            TieBreakPolicy::NearestToOpen => {
                let to_stop = (candle.open - position.stop_loss).abs();
                let to_target = (candle.open - position.take_profit).abs();
                if to_target < to_stop {
                    target
                } else {
                    stop
                }
            }
        }),
    }
}
