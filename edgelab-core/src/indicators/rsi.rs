//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: no movement → 50; avg_loss == 0 → 100; avg_gain == 0 → 0.

use super::Indicator;
use crate::domain::Candle;

/// Neutral RSI reported during warm-up.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let changes: Vec<f64> = candles
            .windows(2)
            .map(|w| w[1].close - w[0].close)
            .collect();

        // Seed over the first `period` changes
        let (mut avg_gain, mut avg_loss) = changes[..self.period]
            .iter()
            .fold((0.0, 0.0), |(g, l), &ch| {
                if ch > 0.0 {
                    (g + ch, l)
                } else {
                    (g, l - ch)
                }
            });
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;
        result[self.period] = rsi_from_averages(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            let ch = changes[i - 1];
            let gain = ch.max(0.0);
            let loss = (-ch).max(0.0);
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            result[i] = rsi_from_averages(avg_gain, avg_loss);
        }

        result
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        NEUTRAL_RSI
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    #[test]
    fn rsi_all_gains() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&candles);
        assert_approx(result[3], 100.0, 1e-6);
        assert_approx(result[5], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let candles = make_candles(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&candles);
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_is_neutral() {
        let candles = make_candles(&[100.0; 8]);
        let result = Rsi::new(3).compute(&candles);
        assert_approx(result[7], NEUTRAL_RSI, 1e-12);
    }

    #[test]
    fn rsi_mixed_seed() {
        // changes +0.34, -0.25, -0.48 → 100 - 100 / (1 + 0.34/0.73)
        let candles = make_candles(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&candles);
        assert!(result[2].is_nan());
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3], expected, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let candles = make_candles(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&candles);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
