//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    k: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(band: BollingerBand, period: usize, k: f64) -> Self {
        let period = period.max(1);
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            k,
            band,
            name: format!("bollinger_{label}_{period}_{k}"),
        }
    }

    pub fn upper(period: usize, k: f64) -> Self {
        Self::new(BollingerBand::Upper, period, k)
    }

    pub fn middle(period: usize, k: f64) -> Self {
        Self::new(BollingerBand::Middle, period, k)
    }

    pub fn lower(period: usize, k: f64) -> Self {
        Self::new(BollingerBand::Lower, period, k)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &candles[i + 1 - self.period..=i];
            let mean = window.iter().map(|c| c.close).sum::<f64>() / self.period as f64;
            result[i] = match self.band {
                BollingerBand::Middle => mean,
                BollingerBand::Upper | BollingerBand::Lower => {
                    let variance = window
                        .iter()
                        .map(|c| (c.close - mean).powi(2))
                        .sum::<f64>()
                        / self.period as f64;
                    let offset = self.k * variance.sqrt();
                    if self.band == BollingerBand::Upper {
                        mean + offset
                    } else {
                        mean - offset
                    }
                }
            };
        }

        result
    }
}
