//! Fixed grid.
//!
//! The first entry of a grid follows the EMA direction. After that, every `spacing` move from
//! the last grid price adds an equal-size entry against the move (buy the dip, sell the rally).
//! Each entry targets one spacing and stops out when price runs `max_levels` spacings the wrong
//! way. The risk governor resets the grid after `max_levels` entries.

use super::{bracket, SignalGenerator, StrategyState};
use crate::domain::{Candle, GridParams, Side, StrategyId, TradingSignal};
use crate::indicators::IndicatorSnapshot;

const CONFIDENCE: f64 = 80.0;

#[derive(Debug, Clone)]
pub struct GridStrategy {
    params: GridParams,
}

impl GridStrategy {
    pub fn new(params: GridParams) -> Self {
        Self { params }
    }
}

impl SignalGenerator for GridStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::Grid
    }

    fn warmup_candles(&self) -> usize {
        1
    }

    fn evaluate(
        &self,
        candles: &[Candle],
        index: usize,
        snap: &IndicatorSnapshot,
        state: &StrategyState,
    ) -> TradingSignal {
        let id = self.id();
        let close = candles[index].close;
        let spacing = self.params.spacing;

        let side = match state.last_grid_price {
            None if snap.ema_fast > 0.0 && snap.ema_fast > snap.ema_slow => Side::Buy,
            None if snap.ema_fast > 0.0 && snap.ema_fast < snap.ema_slow => Side::Sell,
            None => return TradingSignal::hold(id, "no direction to open grid"),
            Some(last) if close <= last - spacing => Side::Buy,
            Some(last) if close >= last + spacing => Side::Sell,
            Some(_) => return TradingSignal::hold(id, "inside grid spacing"),
        };

        let stop_distance = spacing * self.params.max_levels as f64;
        let reward_ratio = 1.0 / self.params.max_levels as f64;
        let (stop_loss, take_profit) = bracket(side, close, stop_distance, reward_ratio);
        TradingSignal::entry(
            side,
            close,
            stop_loss,
            take_profit,
            CONFIDENCE,
            id,
            format!("grid level {}", state.grid_level_count + 1),
        )
    }
}
