//! Martingale entry signal.
//!
//! Direction follows the EMA stack; stop and target are symmetric ATR multiples so that every
//! outcome is a clean win or loss for the sizing overlay. One sequence position at a time: the
//! overlay decides the next volume from how the previous one closed.

use super::{bracket, SignalGenerator, StrategyState};
use crate::domain::{Candle, Side, StrategyId, StrategyParams, TradingSignal};
use crate::indicators::IndicatorSnapshot;

const CONFIDENCE: f64 = 80.0;

#[derive(Debug, Clone)]
pub struct MartingaleStrategy {
    params: StrategyParams,
}

impl MartingaleStrategy {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }
}

impl SignalGenerator for MartingaleStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::Martingale
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
        if state.open_exposure > 0.0 {
            return TradingSignal::hold(id, "sequence position open");
        }
        if snap.atr <= 0.0 || snap.ema_fast <= 0.0 {
            return TradingSignal::hold(id, "indicators not ready");
        }
        let close = candles[index].close;
        let side = if snap.ema_fast > snap.ema_slow && close > snap.ema_fast {
            Side::Buy
        } else if snap.ema_fast < snap.ema_slow && close < snap.ema_fast {
            Side::Sell
        } else {
            return TradingSignal::hold(id, "no ema direction");
        };

        let stop_distance = snap.atr * self.params.martingale_stop_atr;
        let (stop_loss, take_profit) = bracket(side, close, stop_distance, 1.0);
        TradingSignal::entry(
            side,
            close,
            stop_loss,
            take_profit,
            CONFIDENCE,
            id,
            format!("martingale level {}", state.martingale_level),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalAction;
    use crate::strategies::test_support::{at, candle};

    fn snap() -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: 2001.0,
            ema_slow: 2000.0,
            atr: 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn symmetric_bracket() {
        let candles = vec![candle(at(2, 3, 0), 2001.0, 2003.0, 2000.5, 2002.0, 1000.0)];
        let signal = MartingaleStrategy::new(StrategyParams::default()).evaluate(
            &candles,
            0,
            &snap(),
            &StrategyState::default(),
        );
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.stop_loss, 1999.0);
        assert_eq!(signal.take_profit, 2005.0);
        assert!((signal.risk_reward - 1.0).abs() < 1e-12);
        assert!(signal.is_executable());
    }

    #[test]
    fn waits_while_sequence_position_is_open() {
        let candles = vec![candle(at(2, 3, 0), 2001.0, 2003.0, 2000.5, 2002.0, 1000.0)];
        let state = StrategyState {
            open_exposure: 0.02,
            ..Default::default()
        };
        let signal = MartingaleStrategy::new(StrategyParams::default()).evaluate(
            &candles,
            0,
            &snap(),
            &state,
        );
        assert!(signal.is_hold());
    }
}
