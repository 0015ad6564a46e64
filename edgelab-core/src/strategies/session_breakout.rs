//! Session breakout: trade a break of the range-session high/low during the breakout session.
//!
//! The range is built by the indicator layer from the candles inside the range window of the
//! current UTC day. A close beyond the range by `breakout_buffer_atr` ATRs, inside the breakout
//! window, fires at most once per day.

use chrono::Timelike;

use super::{bonus, bracket, SignalGenerator, StrategyState};
use crate::domain::{Candle, SessionWindows, Side, StrategyId, StrategyParams, TradingSignal};
use crate::indicators::{IndicatorSnapshot, Trend};

const BASE_CONFIDENCE: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct SessionBreakout {
    sessions: SessionWindows,
    params: StrategyParams,
}

impl SessionBreakout {
    pub fn new(sessions: SessionWindows, params: StrategyParams) -> Self {
        Self { sessions, params }
    }
}

impl SignalGenerator for SessionBreakout {
    fn id(&self) -> StrategyId {
        StrategyId::SessionBreakout
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
        let candle = &candles[index];

        if !self.sessions.breakout.contains(candle.timestamp.hour()) {
            return TradingSignal::hold(id, "outside breakout session");
        }
        if state
            .last_entry_time
            .is_some_and(|t| t.date_naive() == candle.timestamp.date_naive())
        {
            return TradingSignal::hold(id, "already traded this session");
        }
        let range = match snap.range_session {
            Some(r) if r.width() > 0.0 => r,
            _ => return TradingSignal::hold(id, "no session range"),
        };

        let buffer = snap.atr * self.params.breakout_buffer_atr;
        let side = if candle.close > range.high + buffer {
            Side::Buy
        } else if candle.close < range.low - buffer {
            Side::Sell
        } else {
            return TradingSignal::hold(id, "inside session range");
        };

        let stop_distance = if snap.atr > 0.0 {
            snap.atr * self.params.breakout_stop_atr
        } else {
            range.width() / 2.0
        };
        let (stop_loss, take_profit) =
            bracket(side, candle.close, stop_distance, self.params.reward_ratio);

        let directional_body = match side {
            Side::Buy => candle.is_bullish(),
            Side::Sell => candle.is_bearish(),
        } && candle.body() >= 0.5 * candle.range();
        let trend_agrees = matches!(
            (side, snap.htf_trend),
            (Side::Buy, Trend::Up) | (Side::Sell, Trend::Down)
        );

        let mut confidence = BASE_CONFIDENCE;
        confidence = bonus(confidence, directional_body, 10.0);
        let volume_surge = snap.volume_sma > 0.0 && candle.volume > snap.volume_sma;
        confidence = bonus(confidence, volume_surge, 10.0);
        confidence = bonus(confidence, trend_agrees, 5.0);

        TradingSignal::entry(
            side,
            candle.close,
            stop_loss,
            take_profit,
            confidence,
            id,
            format!(
                "{} break of session range {:.2}-{:.2}",
                if side == Side::Buy { "upside" } else { "downside" },
                range.low,
                range.high
            ),
        )
    }
}
