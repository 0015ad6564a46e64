//! Mean reversion: fade a close outside the Bollinger band when RSI confirms the extreme.
//!
//! Target is the middle band. A stochastic extreme and a weak trend (low ADX) raise confidence.

use super::{bonus, SignalGenerator, StrategyState};
use crate::domain::{Candle, Side, StrategyId, StrategyParams, TradingSignal};
use crate::indicators::IndicatorSnapshot;

const BASE_CONFIDENCE: f64 = 65.0;
const WEAK_TREND_ADX: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct MeanReversion {
    params: StrategyParams,
}

impl MeanReversion {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }
}

impl SignalGenerator for MeanReversion {
    fn id(&self) -> StrategyId {
        StrategyId::MeanReversion
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
        let close = candles[index].close;
        if snap.bollinger_middle <= 0.0 || snap.atr <= 0.0 {
            return TradingSignal::hold(id, "bands not formed");
        }

        let p = &self.params;
        let (side, stochastic_extreme, rsi_depth) =
            if close < snap.bollinger_lower && snap.rsi <= p.rsi_oversold {
                (Side::Buy, snap.stochastic_k < 20.0, p.rsi_oversold - snap.rsi)
            } else if close > snap.bollinger_upper && snap.rsi >= p.rsi_overbought {
                (Side::Sell, snap.stochastic_k > 80.0, snap.rsi - p.rsi_overbought)
            } else {
                return TradingSignal::hold(id, "no band extreme");
            };

        let stop_distance = snap.atr * p.reversion_stop_atr;
        let stop_loss = close - side.sign() * stop_distance;
        let take_profit = if (snap.bollinger_middle - close) * side.sign() > 0.0 {
            snap.bollinger_middle
        } else {
            close + side.sign() * stop_distance * p.reward_ratio
        };

        let mut confidence = BASE_CONFIDENCE;
        confidence = bonus(confidence, stochastic_extreme, 10.0);
        confidence = bonus(confidence, snap.adx < WEAK_TREND_ADX, 10.0);
        confidence = bonus(confidence, rsi_depth >= 10.0, 5.0);

        TradingSignal::entry(
            side,
            close,
            stop_loss,
            take_profit,
            confidence,
            id,
            format!("band extreme, rsi {:.1}", snap.rsi),
        )
    }
}
