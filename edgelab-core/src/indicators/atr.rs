//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (alpha = 1/period).
//! Lookback: period (TR[0] has no previous close and is excluded from the seed).

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series.
/// TR[0] = high[0] - low[0]; TR[t] = max(high-low, |high-prev_close|, |low-prev_close|).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());
    for (i, c) in candles.iter().enumerate() {
        if i == 0 {
            tr.push(c.high - c.low);
        } else {
            let pc = candles[i - 1].close;
            tr.push((c.high - c.low).max((c.high - pc).abs()).max((c.low - pc).abs()));
        }
    }
    tr
}

/// Wilder smoothing. Alpha = 1/period.
///
/// Seed: mean of the first `period` consecutive non-NaN values. NaN after the seed stops the
/// series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut run = 0usize;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
        } else {
            run += 1;
            if run == period {
                seed_end = Some(i + 1);
                break;
            }
        }
    }
    let seed_end = match seed_end {
        Some(e) => e,
        None => return result,
    };

    let seed = values[seed_end - period..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        let smoothed = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut tr = true_range(candles);
        if let Some(first) = tr.first_mut() {
            *first = f64::NAN;
        }
        wilder_smooth(&tr, self.period)
    }
}
