//! MACD: EMA(fast) - EMA(slow), signal line = EMA of MACD, histogram = MACD - signal.
//!
//! Lookback: slow - 1 for the MACD line, slow + signal - 2 for signal and histogram.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(line: MacdLine, fast: usize, slow: usize, signal: usize) -> Self {
        let (fast, slow, signal) = (fast.max(1), slow.max(1), signal.max(1));
        let label = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_hist",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{label}_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let macd = self.fast.max(self.slow) - 1;
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal | MacdLine::Histogram => macd + self.signal - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        if self.line == MacdLine::Macd {
            return macd;
        }
        let signal = ema_of_series(&macd, self.signal);
        match self.line {
            MacdLine::Signal => signal,
            _ => macd.iter().zip(&signal).map(|(m, s)| m - s).collect(),
        }
    }
}
