//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over `k` candles
//! (50 when the window has no range); %D = SMA(%K, d).

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k: usize,
    d: usize,
    line: StochasticLine,
    name: String,
}

impl Stochastic {
    pub fn new(line: StochasticLine, k: usize, d: usize) -> Self {
        let (k, d) = (k.max(1), d.max(1));
        let label = match line {
            StochasticLine::K => "stoch_k",
            StochasticLine::D => "stoch_d",
        };
        Self {
            k,
            d,
            line,
            name: format!("{label}_{k}_{d}"),
        }
    }

    fn percent_k(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n < self.k {
            return result;
        }
        for i in (self.k - 1)..n {
            let window = &candles[i + 1 - self.k..=i];
            let hh = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let ll = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let range = hh - ll;
            result[i] = if range > 0.0 {
                100.0 * (candles[i].close - ll) / range
            } else {
                50.0
            };
        }
        result
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            StochasticLine::K => self.k - 1,
            StochasticLine::D => self.k + self.d - 2,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let k = self.percent_k(candles);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => sma_of_series(&k, self.d),
        }
    }
}
