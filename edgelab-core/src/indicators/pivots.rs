//! Classic floor pivots from the prior UTC day's high, low and close.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub s1: f64,
    pub r2: f64,
    pub s2: f64,
}

impl PivotLevels {
    pub fn from_hlc(high: f64, low: f64, close: f64) -> Self {
        let pivot = (high + low + close) / 3.0;
        Self {
            pivot,
            r1: 2.0 * pivot - low,
            s1: 2.0 * pivot - high,
            r2: pivot + (high - low),
            s2: pivot - (high - low),
        }
    }
}

/// Pivot levels in force at each candle: built from the most recent completed UTC day in the
/// series. `None` on the first day.
pub fn daily_pivots(candles: &[Candle]) -> Vec<Option<PivotLevels>> {
    let mut result = Vec::with_capacity(candles.len());
    let mut current_day = None;
    let (mut high, mut low, mut close) = (f64::MIN, f64::MAX, 0.0);
    let mut levels = None;

    for c in candles {
        let date = c.timestamp.date_naive();
        if current_day != Some(date) {
            if current_day.is_some() {
                levels = Some(PivotLevels::from_hlc(high, low, close));
            }
            current_day = Some(date);
            high = f64::MIN;
            low = f64::MAX;
        }
        high = high.max(c.high);
        low = low.min(c.low);
        close = c.close;
        result.push(levels);
    }
    result
}
