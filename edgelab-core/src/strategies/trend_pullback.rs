//! Dual-timeframe trend pullback.
//!
//! The higher-timeframe close vs. its EMA sets the direction. On the lower timeframe the
//! previous candle must have pulled back to the fast EMA and the current candle must close
//! back beyond it in the trend direction. The stop sits past the pullback extreme.

use super::{bonus, bracket, SignalGenerator, StrategyState};
use crate::domain::{Candle, Side, StrategyId, StrategyParams, TradingSignal};
use crate::indicators::{IndicatorSnapshot, Trend};

const BASE_CONFIDENCE: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct TrendPullback {
    params: StrategyParams,
}

impl TrendPullback {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }
}

impl SignalGenerator for TrendPullback {
    fn id(&self) -> StrategyId {
        StrategyId::TrendPullback
    }

    fn warmup_candles(&self) -> usize {
        self.params.pullback_lookback.max(1)
    }

    fn evaluate(
        &self,
        candles: &[Candle],
        index: usize,
        snap: &IndicatorSnapshot,
        _state: &StrategyState,
    ) -> TradingSignal {
        let id = self.id();
        if index == 0 || snap.ema_fast <= 0.0 || snap.atr <= 0.0 {
            return TradingSignal::hold(id, "indicators not ready");
        }
        let candle = &candles[index];
        let prev = &candles[index - 1];
        let start = index.saturating_sub(self.params.pullback_lookback.saturating_sub(1));
        let window = &candles[start..=index];

        let side = match snap.htf_trend {
            Trend::Up
                if snap.ema_fast > snap.ema_slow
                    && prev.low <= snap.ema_fast
                    && candle.close > snap.ema_fast
                    && candle.is_bullish() =>
            {
                Side::Buy
            }
            Trend::Down
                if snap.ema_fast < snap.ema_slow
                    && prev.high >= snap.ema_fast
                    && candle.close < snap.ema_fast
                    && candle.is_bearish() =>
            {
                Side::Sell
            }
            Trend::Flat => return TradingSignal::hold(id, "no higher-timeframe trend"),
            _ => return TradingSignal::hold(id, "no pullback"),
        };

        let buffer = 0.25 * snap.atr;
        let extreme = match side {
            Side::Buy => window.iter().map(|c| c.low).fold(f64::MAX, f64::min) - buffer,
            Side::Sell => window.iter().map(|c| c.high).fold(f64::MIN, f64::max) + buffer,
        };
        let stop_distance = (candle.close - extreme) * side.sign();
        if stop_distance <= 0.0 {
            return TradingSignal::hold(id, "stop on wrong side");
        }
        let (stop_loss, take_profit) =
            bracket(side, candle.close, stop_distance, self.params.reward_ratio);

        let momentum_agrees = snap.macd_histogram * side.sign() > 0.0;
        let rsi_room = match side {
            Side::Buy => (40.0..=65.0).contains(&snap.rsi),
            Side::Sell => (35.0..=60.0).contains(&snap.rsi),
        };

        let mut confidence = BASE_CONFIDENCE;
        confidence = bonus(confidence, snap.adx > 20.0, 10.0);
        confidence = bonus(confidence, rsi_room, 5.0);
        confidence = bonus(confidence, momentum_agrees, 5.0);

        TradingSignal::entry(
            side,
            candle.close,
            stop_loss,
            take_profit,
            confidence,
            id,
            format!("pullback to ema {:.2} with higher-timeframe trend", snap.ema_fast),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalAction;
    use crate::strategies::test_support::{at, candle};

    fn uptrend_snap() -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: 2005.0,
            ema_slow: 2000.0,
            atr: 4.0,
            adx: 28.0,
            rsi: 55.0,
            macd_histogram: 0.4,
            htf_close: 2010.0,
            htf_ema: 1995.0,
            htf_trend: Trend::Up,
            ..Default::default()
        }
    }

    fn pullback_candles() -> Vec<Candle> {
        vec![
            candle(at(2, 10, 0), 2010.0, 2011.0, 2007.0, 2008.0, 1000.0),
            candle(at(2, 10, 15), 2008.0, 2008.5, 2004.0, 2005.5, 1000.0),
            candle(at(2, 10, 30), 2005.5, 2009.0, 2005.0, 2008.5, 1000.0),
        ]
    }

    #[test]
    fn buys_pullback_in_uptrend() {
        let signal = TrendPullback::new(StrategyParams::default()).evaluate(
            &pullback_candles(),
            2,
            &uptrend_snap(),
            &StrategyState::default(),
        );
        assert_eq!(signal.action, SignalAction::Buy);
        // lowest low 2004 minus 0.25 * atr
        assert_eq!(signal.stop_loss, 2003.0);
        assert_eq!(signal.take_profit, 2008.5 + 2.0 * 5.5);
        assert!(signal.is_executable());
    }

    #[test]
    fn no_higher_timeframe_trend_holds() {
        let snap = IndicatorSnapshot {
            htf_trend: Trend::Flat,
            ..uptrend_snap()
        };
        let signal = TrendPullback::new(StrategyParams::default()).evaluate(
            &pullback_candles(),
            2,
            &snap,
            &StrategyState::default(),
        );
        assert!(signal.is_hold());
    }

    #[test]
    fn counter_trend_candle_holds() {
        let snap = IndicatorSnapshot {
            htf_trend: Trend::Down,
            ..uptrend_snap()
        };
        let signal = TrendPullback::new(StrategyParams::default()).evaluate(
            &pullback_candles(),
            2,
            &snap,
            &StrategyState::default(),
        );
        assert!(signal.is_hold());
    }
}
