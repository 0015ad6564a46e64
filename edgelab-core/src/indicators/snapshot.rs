//! Indicator precomputation and per-candle snapshots.
//!
//! All series are computed once before the candle loop. The loop then reads an
//! [`IndicatorSnapshot`] per index, which never carries NaN.

use serde::{Deserialize, Serialize};

use super::adx::{Adx, AdxLine};
use super::atr::Atr;
use super::bollinger::Bollinger;
use super::ema::Ema;
use super::macd::{Macd, MacdLine};
use super::pivots::{daily_pivots, PivotLevels};
use super::rsi::{Rsi, NEUTRAL_RSI};
use super::session::{session_ranges, SessionRange};
use super::sma::{sma_of_series, Sma};
use super::stochastic::{Stochastic, StochasticLine};
use super::swing::{swing_highs, swing_lows};
use super::timeframe::{higher_timeframe_ema, HigherTimeframe};
use super::vwap::Vwap;
use super::{at, or_neutral, Indicator};
use crate::domain::{Candle, IndicatorParams, SessionWindows};

/// Direction of the higher-timeframe trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Flat,
}

/// Indicator values at one candle. Unavailable numeric values are neutral (0, or 50 for the
/// bounded oscillators); unavailable structural levels are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    // ── Moving averages ──
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub ema_trend: f64,

    // ── Oscillators ──
    pub rsi: f64,
    pub stochastic_k: f64,
    pub stochastic_d: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub prev_macd_histogram: f64,

    // ── Trend strength / volatility ──
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub atr: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,

    // ── Volume ──
    pub vwap: f64,
    pub volume_sma: f64,

    // ── Levels ──
    pub pivots: Option<PivotLevels>,
    pub range_session: Option<SessionRange>,
    pub swing_high: Option<f64>,
    pub swing_low: Option<f64>,

    // ── Higher timeframe ──
    pub htf_close: f64,
    pub htf_ema: f64,
    pub htf_trend: Trend,
}

/// Every indicator series for one run, aligned with the candle slice.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    sma_fast: Vec<f64>,
    sma_slow: Vec<f64>,
    ema_fast: Vec<f64>,
    ema_slow: Vec<f64>,
    ema_trend: Vec<f64>,
    rsi: Vec<f64>,
    stochastic_k: Vec<f64>,
    stochastic_d: Vec<f64>,
    macd: Vec<f64>,
    macd_signal: Vec<f64>,
    macd_histogram: Vec<f64>,
    adx: Vec<f64>,
    plus_di: Vec<f64>,
    minus_di: Vec<f64>,
    atr: Vec<f64>,
    bollinger_upper: Vec<f64>,
    bollinger_middle: Vec<f64>,
    bollinger_lower: Vec<f64>,
    vwap: Vec<f64>,
    volume_sma: Vec<f64>,
    pivots: Vec<Option<PivotLevels>>,
    range_session: Vec<Option<SessionRange>>,
    swing_high: Vec<f64>,
    swing_low: Vec<f64>,
    htf: HigherTimeframe,
    warmup: usize,
}

impl IndicatorSet {
    pub fn compute(
        candles: &[Candle],
        params: &IndicatorParams,
        sessions: &SessionWindows,
    ) -> Self {
        let p = params;
        let series: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(p.sma_fast)),
            Box::new(Sma::new(p.sma_slow)),
            Box::new(Ema::new(p.ema_fast)),
            Box::new(Ema::new(p.ema_slow)),
            Box::new(Ema::new(p.ema_trend)),
            Box::new(Rsi::new(p.rsi_period)),
            Box::new(Stochastic::new(StochasticLine::K, p.stochastic_k, p.stochastic_d)),
            Box::new(Stochastic::new(StochasticLine::D, p.stochastic_k, p.stochastic_d)),
            Box::new(Macd::new(MacdLine::Macd, p.macd_fast, p.macd_slow, p.macd_signal)),
            Box::new(Macd::new(MacdLine::Signal, p.macd_fast, p.macd_slow, p.macd_signal)),
            Box::new(Macd::new(MacdLine::Histogram, p.macd_fast, p.macd_slow, p.macd_signal)),
            Box::new(Adx::new(AdxLine::Adx, p.adx_period)),
            Box::new(Adx::new(AdxLine::PlusDi, p.adx_period)),
            Box::new(Adx::new(AdxLine::MinusDi, p.adx_period)),
            Box::new(Atr::new(p.atr_period)),
            Box::new(Bollinger::upper(p.bollinger_period, p.bollinger_k)),
            Box::new(Bollinger::middle(p.bollinger_period, p.bollinger_k)),
            Box::new(Bollinger::lower(p.bollinger_period, p.bollinger_k)),
            Box::new(Vwap::new()),
        ];

        let lookback = series.iter().map(|i| i.lookback()).max().unwrap_or(0);
        let computed: Vec<Vec<f64>> = series.iter().map(|i| i.compute(candles)).collect();
        debug_assert!(computed.iter().all(|s| s.len() == candles.len()));

        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let htf = higher_timeframe_ema(candles, p.htf_factor, p.htf_ema_period);
        let warmup = lookback
            .max(p.volume_period.saturating_sub(1))
            .max(htf.lookback);

        // Consumed in declaration order.
        let mut computed = computed.into_iter();
        let mut next = || computed.next().unwrap_or_default();
        Self {
            sma_fast: next(),
            sma_slow: next(),
            ema_fast: next(),
            ema_slow: next(),
            ema_trend: next(),
            rsi: next(),
            stochastic_k: next(),
            stochastic_d: next(),
            macd: next(),
            macd_signal: next(),
            macd_histogram: next(),
            adx: next(),
            plus_di: next(),
            minus_di: next(),
            atr: next(),
            bollinger_upper: next(),
            bollinger_middle: next(),
            bollinger_lower: next(),
            vwap: next(),
            volume_sma: sma_of_series(&volumes, p.volume_period),
            pivots: daily_pivots(candles),
            range_session: session_ranges(candles, sessions.range),
            swing_high: swing_highs(candles, p.swing_strength),
            swing_low: swing_lows(candles, p.swing_strength),
            htf,
            warmup,
        }
    }

    /// Candles needed before every series is valid (the maximum lookback).
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn len(&self) -> usize {
        self.vwap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vwap.is_empty()
    }

    pub fn snapshot(&self, index: usize) -> IndicatorSnapshot {
        let v = |series: &[f64]| or_neutral(at(series, index), 0.0);
        let osc = |series: &[f64]| or_neutral(at(series, index), NEUTRAL_RSI);
        let level = |series: &[f64]| Some(at(series, index)).filter(|x| x.is_finite());

        let htf_close = v(&self.htf.close);
        let htf_ema = v(&self.htf.ema);
        let htf_trend = if htf_ema == 0.0 || htf_close == htf_ema {
            Trend::Flat
        } else if htf_close > htf_ema {
            Trend::Up
        } else {
            Trend::Down
        };

        IndicatorSnapshot {
            sma_fast: v(&self.sma_fast),
            sma_slow: v(&self.sma_slow),
            ema_fast: v(&self.ema_fast),
            ema_slow: v(&self.ema_slow),
            ema_trend: v(&self.ema_trend),
            rsi: osc(&self.rsi),
            stochastic_k: osc(&self.stochastic_k),
            stochastic_d: osc(&self.stochastic_d),
            macd: v(&self.macd),
            macd_signal: v(&self.macd_signal),
            macd_histogram: v(&self.macd_histogram),
            prev_macd_histogram: index
                .checked_sub(1)
                .map_or(0.0, |prev| or_neutral(at(&self.macd_histogram, prev), 0.0)),
            adx: v(&self.adx),
            plus_di: v(&self.plus_di),
            minus_di: v(&self.minus_di),
            atr: v(&self.atr),
            bollinger_upper: v(&self.bollinger_upper),
            bollinger_middle: v(&self.bollinger_middle),
            bollinger_lower: v(&self.bollinger_lower),
            vwap: v(&self.vwap),
            volume_sma: v(&self.volume_sma),
            pivots: self.pivots.get(index).copied().flatten(),
            range_session: self.range_session.get(index).copied().flatten(),
            swing_high: level(&self.swing_high),
            swing_low: level(&self.swing_low),
            htf_close,
            htf_ema,
            htf_trend,
        }
    }
}
