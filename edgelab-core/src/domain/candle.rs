//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder volume used when a dataset carries no volume column.
pub const PLACEHOLDER_VOLUME: f64 = 1.0;

/// OHLCV candle for a fixed time interval.
///
/// Produced by the dataset provider and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_volume() -> f64 {
    PLACEHOLDER_VOLUME
}

/// Why a candle series was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("candle series is empty")]
    Empty,
    #[error("candle {index} has a non-finite or negative field")]
    InvalidField { index: usize },
    #[error("candle {index} has high below low")]
    InvertedRange { index: usize },
    #[error("candle {index} is not strictly after its predecessor")]
    OutOfOrder { index: usize },
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True if every OHLCV field is finite and non-negative.
    pub fn has_valid_fields(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute distance between open and close.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Check the series invariants the engine relies on: non-empty, finite non-negative fields,
/// high >= low, strictly ascending timestamps.
pub fn validate_series(candles: &[Candle]) -> Result<(), CandleError> {
    if candles.is_empty() {
        return Err(CandleError::Empty);
    }
    for (index, candle) in candles.iter().enumerate() {
        if !candle.has_valid_fields() {
            return Err(CandleError::InvalidField { index });
        }
        if candle.high < candle.low {
            return Err(CandleError::InvertedRange { index });
        }
        if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
            return Err(CandleError::OutOfOrder { index });
        }
    }
    Ok(())
}
