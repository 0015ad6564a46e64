//! VWAP anchored to the UTC day.
//!
//! VWAP = Σ(typical_price * volume) / Σ(volume), both sums reset at each new UTC date.
//! With zero cumulative volume the candle's typical price is used. Lookback: 0.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut result = Vec::with_capacity(candles.len());
        let mut day = None;
        let mut pv = 0.0;
        let mut vol = 0.0;
        for c in candles {
            let date = c.timestamp.date_naive();
            if day != Some(date) {
                day = Some(date);
                pv = 0.0;
                vol = 0.0;
            }
            let tp = c.typical_price();
            pv += tp * c.volume;
            vol += c.volume;
            result.push(if vol > 0.0 { pv / vol } else { tp });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::{TimeZone, Utc};

    fn candle(day: u32, hour: u32, price: f64, volume: f64) -> Candle {
        let t = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        Candle::new(t, price, price, price, price, volume)
    }

    #[test]
    fn volume_weighted_within_day() {
        let candles = vec![candle(2, 0, 100.0, 1.0), candle(2, 1, 110.0, 3.0)];
        let vwap = Vwap::new().compute(&candles);
        assert_approx(vwap[0], 100.0, DEFAULT_EPSILON);
        assert_approx(vwap[1], (100.0 + 330.0) / 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn resets_on_new_day() {
        let candles = vec![candle(2, 23, 100.0, 5.0), candle(3, 0, 120.0, 1.0)];
        let vwap = Vwap::new().compute(&candles);
        assert_approx(vwap[1], 120.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_volume_uses_typical_price() {
        let candles = vec![candle(2, 0, 100.0, 0.0), candle(2, 1, 104.0, 0.0)];
        let vwap = Vwap::new().compute(&candles);
        assert_approx(vwap[1], 104.0, DEFAULT_EPSILON);
    }
}
