//! Equity accounting: one point per processed candle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account snapshot at a candle close.
///
/// `equity = balance + unrealized P&L of open positions`; `drawdown` is measured from the
/// running equity peak and is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
    pub equity: f64,
    pub drawdown: f64,
    pub drawdown_percent: f64,
}

/// Running peak tracker used to derive drawdown for each new point.
#[derive(Debug, Clone)]
pub struct EquityTracker {
    peak: f64,
}

impl EquityTracker {
    pub fn new(initial_equity: f64) -> Self {
        Self {
            peak: initial_equity,
        }
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// Update the peak and build the point.
    pub fn record(&mut self, timestamp: DateTime<Utc>, balance: f64, equity: f64) -> EquityPoint {
        if equity > self.peak {
            self.peak = equity;
        }
        let drawdown = (self.peak - equity).max(0.0);
        let drawdown_percent = if self.peak > 0.0 {
            drawdown / self.peak * 100.0
        } else {
            0.0
        };
        EquityPoint {
            timestamp,
            balance,
            equity,
            drawdown,
            drawdown_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn drawdown_from_running_peak() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut tracker = EquityTracker::new(10_000.0);
        let p1 = tracker.record(t, 10_000.0, 10_500.0);
        assert_eq!(p1.drawdown, 0.0);
        let p2 = tracker.record(t, 10_000.0, 10_290.0);
        assert!((p2.drawdown - 210.0).abs() < 1e-9);
        assert!((p2.drawdown_percent - 2.0).abs() < 1e-9);
        assert_eq!(tracker.peak(), 10_500.0);
    }

    #[test]
    fn drawdown_never_negative() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut tracker = EquityTracker::new(10_000.0);
        for eq in [9_000.0, 11_000.0, 12_000.0] {
            assert!(tracker.record(t, eq, eq).drawdown >= 0.0);
        }
        assert_eq!(tracker.record(t, 13_000.0, 13_000.0).drawdown, 0.0);
    }
}
