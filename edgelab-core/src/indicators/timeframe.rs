//! Higher-timeframe view of a lower-timeframe series.
//!
//! `factor` consecutive candles aggregate into one higher-timeframe candle. Only completed
//! buckets are visible: at lower-timeframe index i the latest usable bucket is the one that
//! ended at or before i.

use super::ema::ema_of_series;
use crate::domain::Candle;

/// Aggregate complete buckets of `factor` candles. A trailing partial bucket is dropped.
pub fn resample(candles: &[Candle], factor: usize) -> Vec<Candle> {
    if factor == 0 {
        return Vec::new();
    }
    candles
        .chunks_exact(factor)
        .map(|bucket| {
            let first = &bucket[0];
            let last = &bucket[bucket.len() - 1];
            Candle {
                timestamp: first.timestamp,
                open: first.open,
                high: bucket.iter().map(|c| c.high).fold(f64::MIN, f64::max),
                low: bucket.iter().map(|c| c.low).fold(f64::MAX, f64::min),
                close: last.close,
                volume: bucket.iter().map(|c| c.volume).sum(),
            }
        })
        .collect()
}

/// Higher-timeframe close and EMA, mapped back onto lower-timeframe indices.
#[derive(Debug, Clone)]
pub struct HigherTimeframe {
    pub close: Vec<f64>,
    pub ema: Vec<f64>,
    pub lookback: usize,
}

/// Completed-bucket close and EMA(`period`) for every lower-timeframe index.
pub fn higher_timeframe_ema(candles: &[Candle], factor: usize, period: usize) -> HigherTimeframe {
    let factor = factor.max(1);
    let period = period.max(1);
    let buckets = resample(candles, factor);
    let closes: Vec<f64> = buckets.iter().map(|c| c.close).collect();
    let ema = ema_of_series(&closes, period);

    let mut ltf_close = vec![f64::NAN; candles.len()];
    let mut ltf_ema = vec![f64::NAN; candles.len()];
    for i in 0..candles.len() {
        let completed = (i + 1) / factor;
        if completed == 0 {
            continue;
        }
        ltf_close[i] = closes[completed - 1];
        ltf_ema[i] = ema[completed - 1];
    }

    HigherTimeframe {
        close: ltf_close,
        ema: ltf_ema,
        lookback: factor * period - 1,
    }
}
