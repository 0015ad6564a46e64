//! Backtesting engine: candle-by-candle loop and the trade lifecycle manager.
//!
//! The engine takes validated candles and a configuration, precomputes every indicator series
//! once, then walks the candles strictly forward:
//!
//! 1. Exits for positions opened on earlier candles
//! 2. Drawdown kill-switch
//! 3. Signal evaluation, risk approval, entry at the close
//! 4. Equity accounting

pub mod loop_runner;
pub mod state;
pub mod trade_book;

pub use loop_runner::run_backtest;
pub use state::{EngineError, RunContext, RunResult};
pub use trade_book::TradeBook;
