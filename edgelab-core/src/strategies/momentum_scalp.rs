//! Momentum scalp: short-horizon continuation on a MACD histogram turn.
//!
//! Every filter must pass: EMA alignment, histogram crossing zero in the trade direction, close
//! on the right side of VWAP, a strong body (>= 60% of the range) and a volume spike.

use super::{bonus, bracket, SignalGenerator, StrategyState};
use crate::domain::{Candle, Side, StrategyId, StrategyParams, TradingSignal};
use crate::indicators::IndicatorSnapshot;

const BASE_CONFIDENCE: f64 = 70.0;
const MIN_BODY_RATIO: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct MomentumScalp {
    params: StrategyParams,
}

impl MomentumScalp {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }
}

impl SignalGenerator for MomentumScalp {
    fn id(&self) -> StrategyId {
        StrategyId::MomentumScalp
    }

    fn warmup_candles(&self) -> usize {
        1
    }

    fn evaluate(
        &self,
        candles: &[Candle],
        index: usize,
        snap: &IndicatorSnapshot,
        _state: &StrategyState,
    ) -> TradingSignal {
        let id = self.id();
        let candle = &candles[index];
        if snap.atr <= 0.0 || snap.volume_sma <= 0.0 || candle.range() <= 0.0 {
            return TradingSignal::hold(id, "indicators not ready");
        }

        let side = if snap.ema_fast > snap.ema_slow
            && snap.macd_histogram > 0.0
            && snap.prev_macd_histogram <= 0.0
            && candle.close > snap.vwap
            && candle.is_bullish()
        {
            Side::Buy
        } else if snap.ema_fast < snap.ema_slow
            && snap.macd_histogram < 0.0
            && snap.prev_macd_histogram >= 0.0
            && candle.close < snap.vwap
            && candle.is_bearish()
        {
            Side::Sell
        } else {
            return TradingSignal::hold(id, "no momentum turn");
        };

        if candle.body() < MIN_BODY_RATIO * candle.range() {
            return TradingSignal::hold(id, "weak candle body");
        }
        if candle.volume < snap.volume_sma * self.params.scalp_volume_spike {
            return TradingSignal::hold(id, "no volume spike");
        }

        let stop_distance = snap.atr * self.params.scalp_stop_atr;
        let (stop_loss, take_profit) = bracket(
            side,
            candle.close,
            stop_distance,
            self.params.scalp_reward_ratio,
        );

        let rsi_ok = match side {
            Side::Buy => (50.0..=70.0).contains(&snap.rsi),
            Side::Sell => (30.0..=50.0).contains(&snap.rsi),
        };
        let with_trend =
            snap.ema_trend > 0.0 && (candle.close - snap.ema_trend) * side.sign() > 0.0;

        let mut confidence = BASE_CONFIDENCE;
        confidence = bonus(confidence, rsi_ok, 5.0);
        confidence = bonus(confidence, snap.adx > 25.0, 5.0);
        confidence = bonus(confidence, with_trend, 5.0);

        TradingSignal::entry(
            side,
            candle.close,
            stop_loss,
            take_profit,
            confidence,
            id,
            format!(
                "macd turn with {:.1}x volume",
                candle.volume / snap.volume_sma
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalAction;
    use crate::strategies::test_support::{at, candle};

    fn bullish_snap() -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: 2004.0,
            ema_slow: 2002.0,
            ema_trend: 1998.0,
            macd_histogram: 0.3,
            prev_macd_histogram: -0.1,
            vwap: 2003.0,
            volume_sma: 1000.0,
            atr: 3.0,
            rsi: 60.0,
            adx: 30.0,
            ..Default::default()
        }
    }

    fn impulse(volume: f64) -> Vec<Candle> {
        vec![candle(at(2, 14, 0), 2003.0, 2008.2, 2002.8, 2008.0, volume)]
    }

    #[test]
    fn bullish_turn_with_volume_buys() {
        let signal = MomentumScalp::new(StrategyParams::default()).evaluate(
            &impulse(2000.0),
            0,
            &bullish_snap(),
            &StrategyState::default(),
        );
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.stop_loss, 2005.0);
        assert_eq!(signal.take_profit, 2012.5);
        assert_eq!(signal.confidence, 85.0);
    }

    #[test]
    fn missing_volume_spike_holds() {
        let signal = MomentumScalp::new(StrategyParams::default()).evaluate(
            &impulse(1200.0),
            0,
            &bullish_snap(),
            &StrategyState::default(),
        );
        assert!(signal.is_hold());
    }

    #[test]
    fn histogram_without_turn_holds() {
        let snap = IndicatorSnapshot {
            prev_macd_histogram: 0.2,
            ..bullish_snap()
        };
        let signal = MomentumScalp::new(StrategyParams::default()).evaluate(
            &impulse(2000.0),
            0,
            &snap,
            &StrategyState::default(),
        );
        assert!(signal.is_hold());
    }
}
