//! Market-structure break.
//!
//! Fires when a close breaks the latest confirmed swing high (or low) for the first time.
//! Confidence comes from what backs the break: an order block (the last opposite candle before
//! the impulse), an unfilled fair-value gap in the break direction, a kill-zone hour and the
//! higher-timeframe trend.

use chrono::Timelike;

use super::{bonus, bracket, SignalGenerator, StrategyState};
use crate::domain::{Candle, SessionWindows, Side, StrategyId, StrategyParams, TradingSignal};
use crate::indicators::{IndicatorSnapshot, Trend};

const BASE_CONFIDENCE: f64 = 60.0;

/// Three-candle imbalance: the wicks of candles k-2 and k do not overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairValueGap {
    pub side: Side,
    pub top: f64,
    pub bottom: f64,
    /// Index of the third candle of the pattern.
    pub index: usize,
}

/// Last opposite-colored candle before an impulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBlock {
    pub side: Side,
    pub high: f64,
    pub low: f64,
    pub index: usize,
}

/// Most recent fair-value gap in `side`'s direction inside `window_start..=index` that later
/// candles (up to `index`) have not filled.
pub fn find_fair_value_gap(
    candles: &[Candle],
    window_start: usize,
    index: usize,
    side: Side,
) -> Option<FairValueGap> {
    let first = window_start.max(2);
    (first..=index).rev().find_map(|k| {
        let (a, c) = (&candles[k - 2], &candles[k]);
        let gap = match side {
            Side::Buy if a.high < c.low => FairValueGap {
                side,
                top: c.low,
                bottom: a.high,
                index: k,
            },
            Side::Sell if a.low > c.high => FairValueGap {
                side,
                top: a.low,
                bottom: c.high,
                index: k,
            },
            _ => return None,
        };
        let filled = candles[k + 1..=index].iter().any(|later| match side {
            Side::Buy => later.low <= gap.bottom,
            Side::Sell => later.high >= gap.top,
        });
        (!filled).then_some(gap)
    })
}

/// Most recent candle opposite to `side` inside `window_start..index`.
pub fn find_order_block(
    candles: &[Candle],
    window_start: usize,
    index: usize,
    side: Side,
) -> Option<OrderBlock> {
    (window_start..index).rev().find_map(|k| {
        let c = &candles[k];
        let opposite = match side {
            Side::Buy => c.is_bearish(),
            Side::Sell => c.is_bullish(),
        };
        opposite.then_some(OrderBlock {
            side,
            high: c.high,
            low: c.low,
            index: k,
        })
    })
}

#[derive(Debug, Clone)]
pub struct StructureBreak {
    sessions: SessionWindows,
    params: StrategyParams,
}

impl StructureBreak {
    pub fn new(sessions: SessionWindows, params: StrategyParams) -> Self {
        Self { sessions, params }
    }
}

impl SignalGenerator for StructureBreak {
    fn id(&self) -> StrategyId {
        StrategyId::StructureBreak
    }

    fn warmup_candles(&self) -> usize {
        self.params.structure_lookback.max(3)
    }

    fn evaluate(
        &self,
        candles: &[Candle],
        index: usize,
        snap: &IndicatorSnapshot,
        _state: &StrategyState,
    ) -> TradingSignal {
        let id = self.id();
        if index == 0 || snap.atr <= 0.0 {
            return TradingSignal::hold(id, "indicators not ready");
        }
        let candle = &candles[index];
        let prev_close = candles[index - 1].close;

        let (side, level) = match (snap.swing_high, snap.swing_low) {
            (Some(high), _) if prev_close <= high && candle.close > high => (Side::Buy, high),
            (_, Some(low)) if prev_close >= low && candle.close < low => (Side::Sell, low),
            _ => return TradingSignal::hold(id, "no structure break"),
        };

        let start = index.saturating_sub(self.params.structure_lookback);
        let order_block = find_order_block(candles, start, index, side);
        let gap = find_fair_value_gap(candles, start, index, side);

        let buffer = 0.1 * snap.atr;
        let protective = match side {
            Side::Buy => order_block.map(|ob| ob.low).or(snap.swing_low),
            Side::Sell => order_block.map(|ob| ob.high).or(snap.swing_high),
        }
        .filter(|lvl| (candle.close - lvl) * side.sign() > 0.0);
        let stop_distance = match protective {
            Some(lvl) => (candle.close - lvl).abs() + buffer,
            None => 1.5 * snap.atr,
        };
        let (stop_loss, take_profit) =
            bracket(side, candle.close, stop_distance, self.params.reward_ratio);

        let trend_agrees = matches!(
            (side, snap.htf_trend),
            (Side::Buy, Trend::Up) | (Side::Sell, Trend::Down)
        );
        let mut confidence = BASE_CONFIDENCE;
        confidence = bonus(confidence, order_block.is_some(), 10.0);
        confidence = bonus(confidence, gap.is_some(), 10.0);
        confidence = bonus(confidence, self.sessions.in_kill_zone(candle.timestamp.hour()), 10.0);
        confidence = bonus(confidence, trend_agrees, 5.0);

        TradingSignal::entry(
            side,
            candle.close,
            stop_loss,
            take_profit,
            confidence,
            id,
            format!(
                "break of swing {:.2}{}{}",
                level,
                if order_block.is_some() { ", order block" } else { "" },
                if gap.is_some() { ", fair value gap" } else { "" }
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalAction;
    use crate::strategies::test_support::{at, candle};

    /// Bearish candle, then an impulse leaving a bullish gap, then a close through 2010.
    fn breakout_candles(hour: u32) -> Vec<Candle> {
        vec![
            candle(at(2, hour, 0), 2004.0, 2005.0, 2000.0, 2001.0, 1000.0),
            candle(at(2, hour, 15), 2001.0, 2007.0, 2001.0, 2006.5, 1000.0),
            candle(at(2, hour, 30), 2006.5, 2009.5, 2006.0, 2009.0, 1000.0),
            candle(at(2, hour, 45), 2009.0, 2012.0, 2008.5, 2011.5, 1000.0),
        ]
    }

    fn snap() -> IndicatorSnapshot {
        IndicatorSnapshot {
            atr: 2.0,
            swing_high: Some(2010.0),
            swing_low: Some(1995.0),
            ..Default::default()
        }
    }

    #[test]
    fn detects_bullish_gap() {
        let candles = breakout_candles(8);
        let gap = find_fair_value_gap(&candles, 0, 3, Side::Buy).unwrap();
        // candle 1 high 2007 < candle 3 low 2008.5
        assert_eq!(gap.index, 3);
        assert_eq!(gap.bottom, 2007.0);
        assert_eq!(gap.top, 2008.5);
    }

    #[test]
    fn filled_gap_is_ignored() {
        let mut candles = breakout_candles(8);
        candles.push(candle(at(2, 9, 0), 2011.5, 2012.0, 2004.5, 2011.0, 1000.0));
        assert!(find_fair_value_gap(&candles, 0, 4, Side::Buy).is_none());
    }

    #[test]
    fn order_block_is_last_opposite_candle() {
        let candles = breakout_candles(8);
        let ob = find_order_block(&candles, 0, 3, Side::Buy).unwrap();
        assert_eq!(ob.index, 0);
        assert_eq!(ob.low, 2000.0);
    }

    #[test]
    fn break_in_kill_zone_is_executable() {
        let candles = breakout_candles(8);
        let strategy = StructureBreak::new(SessionWindows::default(), StrategyParams::default());
        let signal = strategy.evaluate(&candles, 3, &snap(), &StrategyState::default());
        assert_eq!(signal.action, SignalAction::Buy);
        // order block low 2000, buffer 0.2
        assert!((signal.stop_loss - 1999.8).abs() < 1e-9);
        assert_eq!(signal.confidence, 90.0);
        assert!(signal.is_executable());
    }

    #[test]
    fn break_outside_kill_zone_loses_confidence() {
        let candles = breakout_candles(18);
        let strategy = StructureBreak::new(SessionWindows::default(), StrategyParams::default());
        let signal = strategy.evaluate(&candles, 3, &snap(), &StrategyState::default());
        assert_eq!(signal.confidence, 80.0);
    }

    #[test]
    fn no_fresh_break_holds() {
        let candles = breakout_candles(8);
        let snap = IndicatorSnapshot {
            swing_high: Some(2015.0),
            ..snap()
        };
        let strategy = StructureBreak::new(SessionWindows::default(), StrategyParams::default());
        assert!(strategy.evaluate(&candles, 3, &snap, &StrategyState::default()).is_hold());
    }
}
