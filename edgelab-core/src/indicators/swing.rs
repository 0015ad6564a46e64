//! Swing-high / swing-low detection.
//!
//! Candle j is a swing high when its high is strictly above the highs of the `strength`
//! candles on each side. It is confirmed `strength` candles later, so the series at index i
//! only reports pivots with j + strength <= i. Each series carries the latest confirmed level
//! forward (NaN until the first one).

use crate::domain::Candle;

fn latest_confirmed(values: &[f64], strength: usize, beats: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    let mut last = f64::NAN;
    for i in 0..n {
        if strength > 0 && i >= 2 * strength {
            let j = i - strength;
            let v = values[j];
            let is_pivot = values[j - strength..j]
                .iter()
                .chain(&values[j + 1..=i])
                .all(|&other| beats(v, other));
            if is_pivot {
                last = v;
            }
        }
        result[i] = last;
    }
    result
}

/// Latest confirmed swing high at each index.
pub fn swing_highs(candles: &[Candle], strength: usize) -> Vec<f64> {
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    latest_confirmed(&highs, strength, |v, other| v > other)
}

/// Latest confirmed swing low at each index.
pub fn swing_lows(candles: &[Candle], strength: usize) -> Vec<f64> {
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    latest_confirmed(&lows, strength, |v, other| v < other)
}
