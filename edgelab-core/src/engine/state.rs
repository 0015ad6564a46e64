//! Per-run context, engine errors and the raw run result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::trade_book::TradeBook;
use crate::domain::{
    BacktestConfiguration, CandleError, ClosedTrade, ConfigError, EquityPoint, EquityTracker,
    IdGen,
};
use crate::risk::{HaltRecord, RiskGovernor};

/// Errors that stop a run before the first candle. Nothing inside the loop can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid candle data: {0}")]
    Data(#[from] CandleError),
}

/// Everything one run mutates. Built fresh per run and never shared.
#[derive(Debug)]
pub struct RunContext {
    pub balance: f64,
    pub book: TradeBook,
    pub governor: RiskGovernor,
    pub equity: EquityTracker,
    pub equity_curve: Vec<EquityPoint>,
    pub ids: IdGen,
}

impl RunContext {
    pub fn new(config: &BacktestConfiguration, capacity: usize) -> Self {
        Self {
            balance: config.initial_balance,
            book: TradeBook::new(),
            governor: RiskGovernor::new(config),
            equity: EquityTracker::new(config.initial_balance),
            equity_curve: Vec::with_capacity(capacity),
            ids: IdGen::default(),
        }
    }

    /// Apply realized P&L of trades that just closed, starting at ledger index `from`.
    pub fn settle_from(&mut self, from: usize) {
        for trade in &self.book.ledger()[from..] {
            self.balance += trade.pnl;
            self.governor.on_trade_closed(trade);
        }
    }
}

/// Raw output of one engine run; statistics are derived from it by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<ClosedTrade>,
    pub halt: Option<HaltRecord>,
    /// First candle index eligible for entries.
    pub warmup: usize,
    pub candles_processed: usize,
}

impl RunResult {
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }
}
