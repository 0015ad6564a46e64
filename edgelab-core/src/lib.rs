//! EdgeLab Core: domain types, indicators, strategies, risk governor, simulation loop.
//!
//! This crate contains the deterministic part of a backtest:
//! - Domain types (candles, signals, positions, closed trades, configuration)
//! - Indicator library with a per-run precomputed snapshot set
//! - Seven strategy variants behind one `SignalGenerator` capability
//! - Risk governor with martingale/grid overlays and a drawdown kill-switch
//! - Candle-by-candle engine loop and trade lifecycle manager
//!
//! No I/O happens here. Loading data and deriving statistics live in `edgelab-runner`.

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod risk;
pub mod strategies;

pub use engine::{run_backtest, EngineError, RunResult};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a batch worker moves across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::BacktestConfiguration>();
        require_sync::<domain::BacktestConfiguration>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::ClosedTrade>();
        require_sync::<domain::ClosedTrade>();
        require_send::<domain::EquityPoint>();
        require_sync::<domain::EquityPoint>();
        require_send::<domain::TradingSignal>();
        require_sync::<domain::TradingSignal>();

        // Engine and risk
        require_send::<engine::RunResult>();
        require_sync::<engine::RunResult>();
        require_send::<engine::RunContext>();
        require_send::<risk::RiskGovernor>();
        require_send::<risk::HaltRecord>();
        require_sync::<risk::HaltRecord>();

        // Strategies and indicators
        require_send::<strategies::Strategy>();
        require_sync::<strategies::Strategy>();
        require_send::<indicators::IndicatorSet>();
        require_sync::<indicators::IndicatorSet>();
    }

    /// Architecture contract: strategies cannot see the account.
    ///
    /// `SignalGenerator::evaluate` takes the candle history, the snapshot and the read-only
    /// strategy state. Adding a balance or position parameter breaks this test.
    #[test]
    fn signal_generator_has_no_account_parameter() {
        fn _check_trait_object_builds(
            sig: &dyn strategies::SignalGenerator,
            candles: &[domain::Candle],
            snapshot: &indicators::IndicatorSnapshot,
            state: &strategies::StrategyState,
        ) -> domain::TradingSignal {
            sig.evaluate(candles, 0, snapshot, state)
        }
    }
}
