//! Indicator library.
//!
//! Every indicator is a pure function of the candle history: series in, series out. Series are
//! computed once per run by [`IndicatorSet`] and served per candle as an [`IndicatorSnapshot`].
//!
//! Inside a series `f64::NAN` marks "not enough data yet". NaN never leaves this module: the
//! snapshot replaces it with the indicator's neutral value (0, or 50 for the bounded
//! oscillators).
//!
//! # Look-ahead contamination guard
//! No value at candle t may depend on candle t+1 or later. Every series passes the
//! truncated-vs-full test in `snapshot.rs`.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod pivots;
pub mod rsi;
pub mod session;
pub mod sma;
pub mod snapshot;
pub mod stochastic;
pub mod swing;
pub mod timeframe;
pub mod vwap;

pub use adx::{Adx, AdxLine};
pub use atr::{true_range, wilder_smooth, Atr};
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLine};
pub use pivots::{daily_pivots, PivotLevels};
pub use rsi::Rsi;
pub use session::{session_ranges, SessionRange};
pub use sma::{sma_of_series, Sma};
pub use snapshot::{IndicatorSet, IndicatorSnapshot, Trend};
pub use stochastic::{Stochastic, StochasticLine};
pub use swing::{swing_highs, swing_lows};
pub use timeframe::{higher_timeframe_ema, resample, HigherTimeframe};
pub use vwap::Vwap;

use crate::domain::Candle;

/// A single-series indicator.
///
/// Produces one value per input candle. The first `lookback()` values are `f64::NAN`.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Replace a warm-up NaN with the indicator's neutral value.
pub fn or_neutral(value: f64, neutral: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        neutral
    }
}

/// Value at `index`, or NaN when out of range.
pub(crate) fn at(series: &[f64], index: usize) -> f64 {
    series.get(index).copied().unwrap_or(f64::NAN)
}

/// Create synthetic 15-minute candles from close prices for testing.
///
/// open = prev_close (or close for the first candle), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_candles(&data)
}

/// Create 15-minute candles from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Candle::new(
                base + chrono::Duration::minutes(15 * i as i64),
                open,
                high,
                low,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
