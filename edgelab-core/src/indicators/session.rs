//! Session range: running high/low of the candles that fall inside a UTC hour window, reset at
//! each new UTC date.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, HourWindow};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionRange {
    pub high: f64,
    pub low: f64,
}

impl SessionRange {
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Range in force at each candle: the window's candles of the same UTC date up to and
/// including this one. `None` until the first in-window candle of the day.
pub fn session_ranges(candles: &[Candle], window: HourWindow) -> Vec<Option<SessionRange>> {
    let mut result = Vec::with_capacity(candles.len());
    let mut day = None;
    let mut range: Option<SessionRange> = None;

    for c in candles {
        let date = c.timestamp.date_naive();
        if day != Some(date) {
            day = Some(date);
            range = None;
        }
        if window.contains(c.timestamp.hour()) {
            range = Some(match range {
                Some(r) => SessionRange {
                    high: r.high.max(c.high),
                    low: r.low.min(c.low),
                },
                None => SessionRange {
                    high: c.high,
                    low: c.low,
                },
            });
        }
        result.push(range);
    }
    result
}
