//! Signal generation: one closed set of strategy variants behind one capability.
//!
//! Strategies receive the candle history, the indicator snapshot and a read-only view of the
//! strategy state. They never see the account, and they never write state: the risk governor
//! applies every state update.

pub mod grid;
pub mod martingale;
pub mod mean_reversion;
pub mod momentum_scalp;
pub mod session_breakout;
pub mod state;
pub mod structure_break;
pub mod trend_pullback;

pub use grid::GridStrategy;
pub use martingale::MartingaleStrategy;
pub use mean_reversion::MeanReversion;
pub use momentum_scalp::MomentumScalp;
pub use session_breakout::SessionBreakout;
pub use state::StrategyState;
pub use structure_break::{FairValueGap, OrderBlock, StructureBreak};
pub use trend_pullback::TrendPullback;

use crate::domain::{BacktestConfiguration, Candle, Side, StrategyId, TradingSignal};
use crate::indicators::IndicatorSnapshot;

/// Trait for signal generators.
///
/// # Architecture invariant
/// `evaluate` only reads `candles[..=index]`, the snapshot at `index` and the state. A
/// generator that needs the balance or open positions belongs in the risk governor.
pub trait SignalGenerator: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Candles this generator needs on top of the indicator warm-up.
    fn warmup_candles(&self) -> usize;

    /// Evaluate the candle at `index`. Returns a hold signal when nothing fires.
    fn evaluate(
        &self,
        candles: &[Candle],
        index: usize,
        snapshot: &IndicatorSnapshot,
        state: &StrategyState,
    ) -> TradingSignal;
}

/// Every supported strategy. Dispatch is an exhaustive match.
#[derive(Debug, Clone)]
pub enum Strategy {
    SessionBreakout(SessionBreakout),
    MeanReversion(MeanReversion),
    TrendPullback(TrendPullback),
    StructureBreak(StructureBreak),
    MomentumScalp(MomentumScalp),
    Martingale(MartingaleStrategy),
    Grid(GridStrategy),
}

impl Strategy {
    pub fn from_config(config: &BacktestConfiguration) -> Self {
        let params = config.strategy.clone();
        match config.strategy_id {
            StrategyId::SessionBreakout => {
                Strategy::SessionBreakout(SessionBreakout::new(config.sessions.clone(), params))
            }
            StrategyId::MeanReversion => Strategy::MeanReversion(MeanReversion::new(params)),
            StrategyId::TrendPullback => Strategy::TrendPullback(TrendPullback::new(params)),
            StrategyId::StructureBreak => {
                Strategy::StructureBreak(StructureBreak::new(config.sessions.clone(), params))
            }
            StrategyId::MomentumScalp => Strategy::MomentumScalp(MomentumScalp::new(params)),
            StrategyId::Martingale => Strategy::Martingale(MartingaleStrategy::new(params)),
            StrategyId::Grid => Strategy::Grid(GridStrategy::new(config.overlay.grid.clone())),
        }
    }

    fn inner(&self) -> &dyn SignalGenerator {
        match self {
            Strategy::SessionBreakout(s) => s,
            Strategy::MeanReversion(s) => s,
            Strategy::TrendPullback(s) => s,
            Strategy::StructureBreak(s) => s,
            Strategy::MomentumScalp(s) => s,
            Strategy::Martingale(s) => s,
            Strategy::Grid(s) => s,
        }
    }
}

impl SignalGenerator for Strategy {
    fn id(&self) -> StrategyId {
        self.inner().id()
    }

    fn warmup_candles(&self) -> usize {
        self.inner().warmup_candles()
    }

    fn evaluate(
        &self,
        candles: &[Candle],
        index: usize,
        snapshot: &IndicatorSnapshot,
        state: &StrategyState,
    ) -> TradingSignal {
        self.inner().evaluate(candles, index, snapshot, state)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Stop and target for an entry at `price` with the given stop distance.
pub(crate) fn bracket(side: Side, price: f64, stop_distance: f64, reward_ratio: f64) -> (f64, f64) {
    let dir = side.sign();
    (
        price - dir * stop_distance,
        price + dir * stop_distance * reward_ratio,
    )
}

/// Add `bonus` to `confidence` when `condition` holds.
pub(crate) fn bonus(confidence: f64, condition: bool, bonus: f64) -> f64 {
    if condition {
        confidence + bonus
    } else {
        confidence
    }
}
