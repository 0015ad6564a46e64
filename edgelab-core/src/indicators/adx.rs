//! ADX: Average Directional Index (Wilder), with +DI / -DI.
//!
//! 1. +DM / -DM from consecutive candles
//! 2. Wilder-smooth +DM, -DM and TR
//! 3. ±DI = 100 * smoothed(±DM) / smoothed(TR)   (0 when smoothed TR is 0)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)        (0 when the DI sum is 0)
//! 5. ADX = Wilder-smoothed DX
//!
//! Lookback: 2 * period for ADX, period for the DI lines.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdxLine {
    Adx,
    PlusDi,
    MinusDi,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    line: AdxLine,
    name: String,
}

impl Adx {
    pub fn new(line: AdxLine, period: usize) -> Self {
        let period = period.max(1);
        let label = match line {
            AdxLine::Adx => "adx",
            AdxLine::PlusDi => "plus_di",
            AdxLine::MinusDi => "minus_di",
        };
        Self {
            period,
            line,
            name: format!("{label}_{period}"),
        }
    }
}

/// (+DI, -DI) series. Both NaN until the smoothing seed is available.
fn directional_indices(candles: &[Candle], period: usize) -> (Vec<f64>, Vec<f64>) {
    let n = candles.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];
    for i in 1..n {
        let up = candles[i].high - candles[i - 1].high;
        let down = candles[i - 1].low - candles[i].low;
        plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
        minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
    }

    let mut tr = true_range(candles);
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }
    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan() || smooth_plus[i].is_nan() || smooth_minus[i].is_nan() {
            continue;
        }
        if smooth_tr[i] == 0.0 {
            plus_di[i] = 0.0;
            minus_di[i] = 0.0;
        } else {
            plus_di[i] = 100.0 * smooth_plus[i] / smooth_tr[i];
            minus_di[i] = 100.0 * smooth_minus[i] / smooth_tr[i];
        }
    }
    (plus_di, minus_di)
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            AdxLine::Adx => 2 * self.period,
            AdxLine::PlusDi | AdxLine::MinusDi => self.period,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let (plus_di, minus_di) = directional_indices(candles, self.period);
        match self.line {
            AdxLine::PlusDi => plus_di,
            AdxLine::MinusDi => minus_di,
            AdxLine::Adx => {
                let dx: Vec<f64> = plus_di
                    .iter()
                    .zip(&minus_di)
                    .map(|(&p, &m)| {
                        if p.is_nan() || m.is_nan() {
                            f64::NAN
                        } else if p + m == 0.0 {
                            0.0
                        } else {
                            100.0 * (p - m).abs() / (p + m)
                        }
                    })
                    .collect();
                wilder_smooth(&dx, self.period)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_candles;

    fn trending(len: usize, step: f64) -> Vec<Candle> {
        let data: Vec<_> = (0..len)
            .map(|i| {
                let base = 100.0 + i as f64 * step;
                (base - 1.0, base + 3.0, base - 3.0, base + 2.0)
            })
            .collect();
        make_ohlc_candles(&data)
    }

    #[test]
    fn adx_bounds() {
        let candles = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let result = Adx::new(AdxLine::Adx, 3).compute(&candles);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn uptrend_plus_di_dominates() {
        let candles = trending(20, 5.0);
        let plus = Adx::new(AdxLine::PlusDi, 5).compute(&candles);
        let minus = Adx::new(AdxLine::MinusDi, 5).compute(&candles);
        let adx = Adx::new(AdxLine::Adx, 5).compute(&candles);
        assert!(plus[19] > minus[19]);
        assert!(adx[19] > 10.0, "ADX should be elevated in a strong trend, got {}", adx[19]);
    }

    #[test]
    fn flat_series_gives_zero_not_nan() {
        let candles = make_ohlc_candles(&[(100.0, 100.0, 100.0, 100.0); 12]);
        let adx = Adx::new(AdxLine::Adx, 3).compute(&candles);
        let plus = Adx::new(AdxLine::PlusDi, 3).compute(&candles);
        assert_eq!(plus[5], 0.0);
        assert_eq!(adx[11], 0.0);
    }

    #[test]
    fn adx_lookback() {
        assert_eq!(Adx::new(AdxLine::Adx, 14).lookback(), 28);
        assert_eq!(Adx::new(AdxLine::PlusDi, 14).lookback(), 14);
    }

    #[test]
    fn adx_too_few_candles() {
        let candles = make_ohlc_candles(&[(100.0, 105.0, 95.0, 102.0)]);
        assert!(Adx::new(AdxLine::Adx, 3).compute(&candles).iter().all(|v| v.is_nan()));
    }
}
